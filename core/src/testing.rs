//! Fixtures shared by the unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::json;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::service::ListingService;
use crate::session::Session;
use crate::transport::Transport;

pub fn listing_json(id: &str, title: &str) -> serde_json::Value {
    json!({
        "listingId": id,
        "seller": {
            "userID": "seller-1",
            "userName": "Nguyen An",
            "userEmail": "an@example.com",
            "role": {"roleId": 2, "roleName": "MEMBER"},
            "phone": "0900000000",
            "subid": null,
            "userStatus": "ACTIVE"
        },
        "category": {"categoryId": 1, "categoryName": "Electric Car"},
        "title": title,
        "description": "",
        "brand": "VinFast",
        "model": "VF8",
        "year": 2023,
        "mileage": 12000.0,
        "seats": 5,
        "price": 30000.0,
        "contract": "0900000000",
        "status": "ACTIVE",
        "createdAt": "2024-01-15T10:30:00"
    })
}

pub fn page_json(titles: &[&str], number: u32, total_pages: u32) -> String {
    let content: Vec<_> = titles
        .iter()
        .enumerate()
        .map(|(i, t)| listing_json(&format!("l-{number}-{i}"), t))
        .collect();
    json!({
        "content": content,
        "number": number,
        "size": 10,
        "totalPages": total_pages,
        "totalElements": titles.len(),
        "first": number == 0,
        "last": number + 1 >= total_pages
    })
    .to_string()
}

pub fn ok_json(body: &str) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse {
        status: 200,
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: body.to_string(),
    })
}

pub fn status(code: u16, body: &str) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse {
        status: code,
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: body.to_string(),
    })
}

/// Answers requests from a queue and records them.
#[derive(Default)]
pub struct Scripted {
    replies: RefCell<VecDeque<Result<HttpResponse, ApiError>>>,
    pub seen: RefCell<Vec<HttpRequest>>,
}

impl Scripted {
    pub fn new(replies: Vec<Result<HttpResponse, ApiError>>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            seen: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.borrow().len()
    }
}

impl Transport for Scripted {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.seen.borrow_mut().push(request.clone());
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("no scripted reply".to_string())))
    }
}

pub fn service_with(session: Session, transport: &Scripted) -> ListingService<&Scripted> {
    ListingService::new(ApiClient::new("http://localhost:8080", Arc::new(session)), transport)
}
