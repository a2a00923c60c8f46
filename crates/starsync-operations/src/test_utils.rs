use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use starsync_github::{GithubError, Page, PageSource, StarredRepository};

pub fn repo(full_name: &str) -> StarredRepository {
    StarredRepository {
        full_name: full_name.to_string(),
        clone_url: format!("https://github.com/{full_name}.git"),
        ssh_url: None,
        html_url: None,
        description: None,
        private: false,
        fork: false,
        archived: false,
    }
}

pub fn page(names: &[&str], next: Option<&str>) -> Result<Page<StarredRepository>, GithubError> {
    Ok(Page {
        items: names.iter().map(|name| repo(name)).collect(),
        next: next.map(str::to_string),
    })
}

/// Serves scripted responses in order and records every requested URL.
pub struct ScriptedSource {
    responses: Mutex<VecDeque<Result<Page<StarredRepository>, GithubError>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSource {
    pub fn new(responses: Vec<Result<Page<StarredRepository>, GithubError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Arc::default(),
        }
    }

    /// Handle on the requested URLs that outlives the source.
    pub fn requests(&self) -> Arc<Mutex<Vec<String>>> {
        self.requests.clone()
    }
}

impl PageSource for ScriptedSource {
    type Item = StarredRepository;

    fn fetch_page(&self, url: &str) -> Result<Page<StarredRepository>, GithubError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(GithubError::HttpError {
                    status: 404,
                    url: url.to_string(),
                })
            })
    }
}
