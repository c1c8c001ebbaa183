use failure::Error;
use futures::{Future, IntoFuture};
use hyper::header::Headers;
use hyper::Method;
use serde::ser::Serialize;
use serde_json;

use http::{HttpClient, HttpFuture};

pub mod postcodes;
pub use self::postcodes::*;

pub mod routing;
pub use self::routing::*;

pub type ApiFuture<T> = Box<dyn Future<Item = T, Error = Error>>;

fn request<T: Serialize>(http_client: &dyn HttpClient, method: Method, url: String, payload: Option<T>, headers: Option<Headers>) -> HttpFuture {
    let body = if let Some(payload) = payload {
        serde_json::to_string::<T>(&payload).map(Some)
    } else {
        Ok(None)
    };

    let http_client = http_client.cloned();
    let result = body
        .into_future()
        .map_err(From::from)
        .and_then(move |serialized_body| http_client.request(method, url, serialized_body, headers));
    Box::new(result)
}
