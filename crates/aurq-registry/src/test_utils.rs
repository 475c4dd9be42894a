use std::{
    collections::VecDeque,
    io::{Read, Write},
    net::TcpListener,
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use crate::{
    cancel::CancelToken,
    error::Result,
    http_client::{HttpResponse, Transport},
};

type Handler = Box<dyn Fn(&str) -> Option<HttpResponse> + Send + Sync>;

/// In-memory [`Transport`] that records request URLs.
///
/// Replies come from the queue first, then from the handler. A request
/// with no reply available fails with a connection error.
pub struct MockTransport {
    queue: Mutex<VecDeque<HttpResponse>>,
    handler: Option<Handler>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn queued(replies: impl IntoIterator<Item = HttpResponse>) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(replies.into_iter().collect()),
            handler: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn with_handler<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&str) -> Option<HttpResponse> + Send + Sync + 'static,
    {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::new()),
            handler: Some(Box::new(handler)),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Number of requests whose URL contains `needle`.
    pub fn count_matching(&self, needle: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.contains(needle))
            .count()
    }
}

impl Transport for MockTransport {
    fn get(&self, url: &str, _cancel: &CancelToken) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(url.to_string());

        if let Some(reply) = self.queue.lock().unwrap().pop_front() {
            return Ok(reply);
        }
        match self.handler.as_ref().and_then(|handler| handler(url)) {
            Some(reply) => Ok(reply),
            None => Err(ureq::Error::ConnectionFailed.into()),
        }
    }
}

/// Serializes `names` as an RPC envelope of minimal records.
pub fn rpc_body(names: &[&str]) -> String {
    let results: Vec<String> = names
        .iter()
        .map(|name| format!(r#"{{"Name":"{name}","Version":"1.0-1"}}"#))
        .collect();
    format!(
        r#"{{"version":5,"type":"multiinfo","resultcount":{},"results":[{}]}}"#,
        names.len(),
        results.join(",")
    )
}

/// Names carried by the `arg[]` parameters of an info request URL.
pub fn info_args(url: &str) -> Vec<String> {
    let Some((_, query)) = url.split_once('?') else {
        return Vec::new();
    };
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| key == "arg[]")
        .map(|(_, value)| value.into_owned())
        .collect()
}

/// Serves one connection on a local port: reads the request head, waits
/// `delay`, writes `response` verbatim and closes.
///
/// Returns the base URL of the server.
pub fn serve_once(response: impl Into<Vec<u8>>, delay: Duration) -> String {
    let response = response.into();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => return,
                Ok(n) => head.extend_from_slice(&buf[..n]),
            }
        }
        thread::sleep(delay);
        let _ = stream.write_all(&response);
        let _ = stream.flush();
    });

    format!("http://{addr}/")
}
