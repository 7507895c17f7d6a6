use gloo_net::http::{Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::error::BlogClientError;
use crate::model::{AuthResponse, DataEnvelope, Post, PostDraft, PostQuery};
use crate::session::Session;

#[derive(Clone)]
pub struct BlogClientHttp {
    pub base_url: String,
}

impl BlogClientHttp {
    pub fn connect(endpoint: &str) -> Self {
        let base_url = endpoint.trim_end_matches('/').to_string();
        Self { base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Attaches the session token to this one request.
    fn authorized(builder: RequestBuilder, session: &Session) -> RequestBuilder {
        let builder = builder.header("Accept", "application/json");
        match session.bearer() {
            Some(value) => builder.header("Authorization", &value),
            None => builder,
        }
    }

    async fn read<T: DeserializeOwned>(response: Response) -> Result<T, BlogClientError> {
        if response.ok() {
            response.json().await.map_err(BlogClientError::from)
        } else {
            Err(Self::failure(response).await)
        }
    }

    async fn failure(response: Response) -> BlogClientError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        BlogClientError::from_parts(status, &text)
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        password_confirmation: &str,
    ) -> Result<AuthResponse, BlogClientError> {
        let request = Request::post(&self.url("/register"))
            .header("Accept", "application/json")
            .json(&json!({
                "name": name,
                "email": email,
                "password": password,
                "password_confirmation": password_confirmation,
            }))?;
        Self::read(request.send().await?).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, BlogClientError> {
        let request = Request::post(&self.url("/login"))
            .header("Accept", "application/json")
            .json(&json!({ "email": email, "password": password }))?;
        Self::read(request.send().await?).await
    }

    pub async fn logout(&self, session: &Session) -> Result<(), BlogClientError> {
        let response = Self::authorized(Request::post(&self.url("/logout")), session)
            .send()
            .await?;
        if response.ok() {
            Ok(())
        } else {
            Err(Self::failure(response).await)
        }
    }

    pub async fn list_posts(
        &self,
        session: &Session,
        query: &PostQuery,
    ) -> Result<Vec<Post>, BlogClientError> {
        let pairs = query.pairs();
        let builder = Request::get(&self.url("/posts"))
            .query(pairs.iter().map(|(key, value)| (*key, value.as_str())));
        let response = Self::authorized(builder, session).send().await?;
        let body: DataEnvelope<Vec<Post>> = Self::read(response).await?;
        Ok(body.data)
    }

    pub async fn get_post(&self, session: &Session, id: i64) -> Result<Post, BlogClientError> {
        let response = Self::authorized(Request::get(&self.url(&format!("/posts/{id}"))), session)
            .send()
            .await?;
        let body: DataEnvelope<Post> = Self::read(response).await?;
        Ok(body.data)
    }

    pub async fn create_post(
        &self,
        session: &Session,
        draft: &PostDraft,
    ) -> Result<Post, BlogClientError> {
        let request = Self::authorized(Request::post(&self.url("/posts")), session).json(draft)?;
        let body: DataEnvelope<Post> = Self::read(request.send().await?).await?;
        Ok(body.data)
    }

    pub async fn update_post(
        &self,
        session: &Session,
        id: i64,
        draft: &PostDraft,
    ) -> Result<Post, BlogClientError> {
        let request =
            Self::authorized(Request::put(&self.url(&format!("/posts/{id}"))), session).json(draft)?;
        let body: DataEnvelope<Post> = Self::read(request.send().await?).await?;
        Ok(body.data)
    }

    pub async fn delete_post(&self, session: &Session, id: i64) -> Result<(), BlogClientError> {
        let response = Self::authorized(Request::delete(&self.url(&format!("/posts/{id}"))), session)
            .send()
            .await?;
        if response.ok() {
            Ok(())
        } else {
            Err(Self::failure(response).await)
        }
    }
}
