use std::{
    env,
    iter::Peekable,
    path::{Path, PathBuf},
    str::Chars,
};

use crate::error::{PathError, PathResult};

/// Resolves a user supplied path into an absolute [`PathBuf`].
///
/// Expands `$VAR` and `${VAR}` from the environment and a leading `~` to the
/// home directory. Relative results are joined with the current directory.
///
/// # Errors
///
/// * [`PathError::Empty`] if the path is empty after trimming
/// * [`PathError::UnclosedVariable`] for a `${` without a closing brace
/// * [`PathError::MissingEnvVar`] if a referenced variable is not set
/// * [`PathError::CurrentDir`] if the current directory cannot be determined
///
/// # Example
///
/// ```
/// use starsync_utils::path::resolve_path;
///
/// let resolved = resolve_path("/srv/stars").unwrap();
/// assert_eq!(resolved, std::path::PathBuf::from("/srv/stars"));
/// ```
pub fn resolve_path(path: &str) -> PathResult<PathBuf> {
    let path = path.trim();

    if path.is_empty() {
        return Err(PathError::Empty);
    }

    let expanded = PathBuf::from(expand_variables(path)?);
    absolutize(&expanded)
}

fn absolutize(path: &Path) -> PathResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|err| PathError::CurrentDir { source: err })
}

/// Returns the user's home directory, `$HOME` first then `/home/$USER`.
pub fn home_dir() -> PathBuf {
    env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| {
        let user = env::var("USER").unwrap_or_else(|_| "root".to_string());
        PathBuf::from(format!("/home/{user}"))
    })
}

/// Returns `$XDG_CONFIG_HOME`, falling back to `$HOME/.config`.
pub fn xdg_config_home() -> PathBuf {
    env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

fn expand_variables(path: &str) -> PathResult<String> {
    let mut result = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '$' if chars.peek() == Some(&'{') => {
                chars.next();
                let var_name = consume_braced(&mut chars)?;
                push_env_var(&var_name, &mut result, path)?;
            }
            '$' => {
                let var_name = consume_var_name(&mut chars);
                if var_name.is_empty() {
                    result.push('$');
                } else {
                    push_env_var(&var_name, &mut result, path)?;
                }
            }
            '~' if result.is_empty() => result.push_str(&home_dir().to_string_lossy()),
            _ => result.push(c),
        }
    }

    Ok(result)
}

fn consume_braced(chars: &mut Peekable<Chars>) -> PathResult<String> {
    let mut var_name = String::new();

    for c in chars.by_ref() {
        if c == '}' {
            return Ok(var_name);
        }
        var_name.push(c);
    }

    Err(PathError::UnclosedVariable {
        input: format!("${{{var_name}"),
    })
}

fn consume_var_name(chars: &mut Peekable<Chars>) -> String {
    let mut var_name = String::new();

    while let Some(c) = chars.next_if(|c| c.is_alphanumeric() || *c == '_') {
        var_name.push(c);
    }

    var_name
}

fn push_env_var(var_name: &str, result: &mut String, original: &str) -> PathResult<()> {
    match var_name {
        "HOME" => result.push_str(&home_dir().to_string_lossy()),
        "XDG_CONFIG_HOME" => result.push_str(&xdg_config_home().to_string_lossy()),
        _ => {
            let value = env::var(var_name).map_err(|_| {
                PathError::MissingEnvVar {
                    var: var_name.into(),
                    input: original.into(),
                }
            })?;
            result.push_str(&value);
        }
    }
    Ok(())
}
