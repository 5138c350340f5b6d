//! Scripted [`Fetcher`] for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lantern_core::cache::record::http_date;
use lantern_core::{Error, ResponseRecord};

use crate::fetch::Fetcher;
use crate::request::InterceptedRequest;

enum Reply {
    Respond { status: u16, body: String, date: Option<DateTime<Utc>>, headers: Vec<(String, String)> },
    Fail,
}

/// Answers from a table keyed by URL. Unknown URLs fail like a dead network.
#[derive(Default)]
pub struct StubFetcher {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond with a `Date` of now.
    pub fn respond(&self, url: &str, status: u16, body: &str) {
        self.respond_dated(url, status, body, Some(Utc::now()));
    }

    pub fn respond_dated(&self, url: &str, status: u16, body: &str, date: Option<DateTime<Utc>>) {
        self.replies.lock().unwrap().insert(
            url.to_string(),
            Reply::Respond { status, body: body.to_string(), date, headers: Vec::new() },
        );
    }

    /// Respond with a `Date` of now plus extra headers.
    pub fn respond_with_headers(&self, url: &str, status: u16, body: &str, headers: &[(&str, &str)]) {
        let headers = headers.iter().map(|(n, v)| (n.to_string(), v.to_string())).collect();
        self.replies.lock().unwrap().insert(
            url.to_string(),
            Reply::Respond { status, body: body.to_string(), date: Some(Utc::now()), headers },
        );
    }

    pub fn fail(&self, url: &str) {
        self.replies.lock().unwrap().insert(url.to_string(), Reply::Fail);
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<ResponseRecord, Error> {
        let url = request.url.as_str().to_string();
        self.calls.lock().unwrap().push(url.clone());

        let replies = self.replies.lock().unwrap();
        match replies.get(&url) {
            Some(Reply::Respond { status, body, date, headers: extra }) => {
                let mut headers = vec![("content-type".to_string(), "text/plain".to_string())];
                headers.extend(extra.iter().cloned());
                if let Some(date) = date {
                    headers.push(("date".to_string(), http_date(*date)));
                }
                Ok(ResponseRecord::new(url, *status, headers, body.clone()))
            }
            Some(Reply::Fail) | None => Err(Error::Network(format!("connection refused: {url}"))),
        }
    }
}
