use std::time::Duration;

use failure::{Error as FailureError, Fail};
use futures::future::{self, Either};
use futures::prelude::*;
use hyper;
use hyper::client::HttpConnector;
use hyper::header::{ContentType, Headers};
use hyper::{Method, Request, StatusCode, Uri};
use serde::de::Deserialize;
use serde_json;
use tokio_core::reactor::{Handle, Timeout};

use errors::Error;

pub type HttpFuture = Box<dyn Future<Item = Response, Error = FailureError>>;

/// Raw answer of a remote service; non-2xx statuses are not errors at this level.
#[derive(Clone, Debug)]
pub struct Response {
    pub status: StatusCode,
    pub body: String,
}

impl Response {
    pub fn new(status: StatusCode, body: String) -> Self {
        Self { status, body }
    }

    pub fn parse<T: for<'a> Deserialize<'a> + 'static>(&self) -> Result<T, FailureError> {
        let response = &self.body;
        if response.is_empty() {
            serde_json::from_value(serde_json::Value::Null)
        } else {
            serde_json::from_str::<T>(&response)
        }.map_err(From::from)
    }
}

pub trait HttpClient {
    fn cloned(&self) -> Box<dyn HttpClient>;

    fn request(&self, method: Method, url: String, body: Option<String>, headers: Option<Headers>) -> HttpFuture;

    fn get(&self, url: String, headers: Option<Headers>) -> HttpFuture {
        self.request(Method::Get, url, None, headers)
    }

    fn post(&self, url: String, body: Option<String>, headers: Option<Headers>) -> HttpFuture {
        self.request(Method::Post, url, body, headers)
    }
}

/// Plain http client bound to a reactor, with a deadline on every request.
/// A request running past the deadline fails with `Error::HttpTimeout`.
#[derive(Clone)]
pub struct HyperHttpClient {
    client: hyper::Client<HttpConnector>,
    handle: Handle,
    timeout: Duration,
}

impl HyperHttpClient {
    pub fn new(handle: &Handle, timeout: Duration) -> Self {
        Self {
            client: hyper::Client::new(handle),
            handle: handle.clone(),
            timeout,
        }
    }
}

impl HttpClient for HyperHttpClient {
    fn cloned(&self) -> Box<dyn HttpClient> {
        Box::new(self.clone())
    }

    fn request(&self, method: Method, url: String, body: Option<String>, headers: Option<Headers>) -> HttpFuture {
        debug!("Sending {} request to {}", method, url);
        let uri = match url.parse::<Uri>() {
            Ok(uri) => uri,
            Err(e) => {
                return Box::new(future::err(FailureError::from(
                    e.context(format!("Invalid url {}", url)).context(Error::HttpClient),
                )))
            }
        };
        let timeout = match Timeout::new(self.timeout, &self.handle) {
            Ok(timeout) => timeout,
            Err(e) => return Box::new(future::err(FailureError::from(e.context(Error::HttpClient)))),
        };

        let mut req = Request::new(method, uri);
        if let Some(headers) = headers {
            req.headers_mut().extend(headers.iter());
        }
        if let Some(body) = body {
            req.headers_mut().set(ContentType::json());
            req.set_body(body);
        }

        let response = self.client.request(req).and_then(|res| {
            let status = res.status();
            res.body()
                .concat2()
                .map(move |chunk| Response::new(status, String::from_utf8_lossy(&chunk).into_owned()))
        });

        let deadline = self.timeout;
        Box::new(response.select2(timeout).then(move |res| -> Result<Response, FailureError> {
            match res {
                Ok(Either::A((response, _))) => Ok(response),
                Ok(Either::B(((), _))) => Err(format_err!("No response within {:?} from {}", deadline, url)
                    .context(Error::HttpTimeout)
                    .into()),
                Err(Either::A((e, _))) => Err(e.context(format!("Request to {} failed", url)).context(Error::HttpClient).into()),
                Err(Either::B((e, _))) => Err(e.context(Error::HttpClient).into()),
            }
        }))
    }
}

impl HttpClient for Box<dyn HttpClient> {
    fn cloned(&self) -> Box<dyn HttpClient> {
        (**self).cloned()
    }

    fn request(&self, method: Method, url: String, body: Option<String>, headers: Option<Headers>) -> HttpFuture {
        (**self).request(method, url, body, headers)
    }
}

#[cfg(test)]
pub mod tests {
    use std::cell::RefCell;
    use std::net::TcpListener;
    use std::rc::Rc;

    use tokio_core::reactor::Core;

    use super::*;
    use errors::error_kind;

    /// Recorded outgoing request.
    #[derive(Clone, Debug)]
    pub struct Sent {
        pub method: Method,
        pub url: String,
        pub body: Option<String>,
        pub headers: Option<Headers>,
    }

    /// Answers every request with the same canned result.
    #[derive(Clone)]
    pub struct FakeHttpClient {
        answer: Rc<dyn Fn() -> Result<Response, FailureError>>,
        pub sent: Rc<RefCell<Vec<Sent>>>,
    }

    impl FakeHttpClient {
        pub fn responding(status: StatusCode, body: &str) -> Self {
            let body = body.to_string();
            Self::answering(move || Ok(Response::new(status.clone(), body.clone())))
        }

        pub fn failing(kind: Error) -> Self {
            Self::answering(move || Err(format_err!("transport failure").context(kind.clone()).into()))
        }

        fn answering<F: Fn() -> Result<Response, FailureError> + 'static>(f: F) -> Self {
            Self {
                answer: Rc::new(f),
                sent: Rc::new(RefCell::new(vec![])),
            }
        }
    }

    impl HttpClient for FakeHttpClient {
        fn cloned(&self) -> Box<dyn HttpClient> {
            Box::new(self.clone())
        }

        fn request(&self, method: Method, url: String, body: Option<String>, headers: Option<Headers>) -> HttpFuture {
            self.sent.borrow_mut().push(Sent { method, url, body, headers });
            Box::new(future::result((self.answer)()))
        }
    }

    #[test]
    fn empty_body_parses_as_null() {
        let response = Response::new(StatusCode::Ok, String::new());
        let parsed: Option<u32> = response.parse().unwrap();
        assert_eq!(parsed, None);
    }

    #[test]
    fn silent_server_hits_deadline() {
        // Connections complete in the backlog but nothing ever answers.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut core = Core::new().unwrap();
        let client = HyperHttpClient::new(&core.handle(), Duration::from_millis(300));
        let err = core.run(client.get(format!("http://{}/ping", addr), None)).unwrap_err();
        assert_eq!(error_kind(&err), Some(Error::HttpTimeout));
        drop(listener);
    }

    #[test]
    fn boxed_client_delegates() {
        let fake = FakeHttpClient::responding(StatusCode::Ok, "{}");
        let boxed: Box<dyn HttpClient> = fake.cloned();
        let response = boxed.get("http://localhost/ping".to_string(), None).wait().unwrap();
        assert_eq!(response.status, StatusCode::Ok);
        assert_eq!(fake.sent.borrow().len(), 1);
        assert_eq!(fake.sent.borrow()[0].url, "http://localhost/ping");
    }
}
