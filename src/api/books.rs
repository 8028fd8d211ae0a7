//! Book endpoints

use async_trait::async_trait;
use reqwest::Method;

use super::{error_from_body, ApiClient, BookApi};
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookFormData, BookId, BookPatch, DeleteAck, SearchRequest, SearchResponse},
};

#[async_trait]
impl BookApi for ApiClient {
    async fn list_books(&self) -> AppResult<Vec<Book>> {
        let books: Vec<Book> = self.send(self.request(Method::GET, "/books")).await?;
        tracing::debug!("Fetched {} books", books.len());
        Ok(books)
    }

    async fn get_book(&self, id: BookId) -> AppResult<Book> {
        self.send(self.request(Method::GET, &format!("/books/{}", id)))
            .await
    }

    async fn create_book(&self, data: &BookFormData) -> AppResult<Book> {
        let created: Book = self
            .send(self.request(Method::POST, "/books").json(data))
            .await?;
        tracing::info!("Created book id={}", created.id);
        Ok(created)
    }

    async fn update_book(&self, id: BookId, patch: &BookPatch) -> AppResult<Book> {
        let updated: Book = self
            .send(self.request(Method::PATCH, &format!("/books/{}", id)).json(patch))
            .await?;
        tracing::info!("Updated book id={}", updated.id);
        Ok(updated)
    }

    /// The acknowledgement is read whatever the status, the `success` flag decides
    async fn delete_book(&self, id: BookId) -> AppResult<DeleteAck> {
        let response = self
            .request(Method::DELETE, &format!("/books/{}", id))
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        match serde_json::from_slice::<DeleteAck>(&body) {
            Ok(ack) => Ok(ack),
            Err(_) if !status.is_success() => Err(error_from_body(status, &body)),
            Err(e) => Err(AppError::UnexpectedResponse(format!(
                "Invalid delete acknowledgement: {}",
                e
            ))),
        }
    }

    async fn search_books(&self, request: &SearchRequest) -> AppResult<Vec<Book>> {
        let value: serde_json::Value = self
            .send(self.request(Method::POST, "/books/search/books").json(request))
            .await?;

        match SearchResponse::from_value(value) {
            Some(books) => Ok(books),
            None => {
                tracing::error!("Unexpected search result format");
                Ok(Vec::new())
            }
        }
    }
}
