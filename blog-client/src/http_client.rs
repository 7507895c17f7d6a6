use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::BlogClientError;
use crate::model::{AuthResponse, DataEnvelope, NewPost, Post, PostChanges, PostQuery, User};
use crate::session::Session;

#[derive(Clone)]
pub struct BlogClient {
    client: Client,
    base_url: String,
}

impl BlogClient {
    pub fn connect(endpoint: &str) -> Result<Self, BlogClientError> {
        let base_url = endpoint.trim_end_matches('/').to_string();
        Ok(Self {
            client: Client::builder().build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Attaches the session's token, if any, to a single request.
    fn authorized(&self, req: RequestBuilder, session: &Session) -> RequestBuilder {
        match session.bearer() {
            Some(value) => req.header(AUTHORIZATION, value),
            None => req,
        }
    }

    async fn read<T: DeserializeOwned>(resp: Response) -> Result<T, BlogClientError> {
        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            Err(BlogClientError::from_http_response(resp).await)
        }
    }

    pub async fn register(
        &self,
        session: &mut Session,
        name: &str,
        email: &str,
        password: &str,
        password_confirmation: &str,
    ) -> Result<User, BlogClientError> {
        let resp = self
            .client
            .post(self.url("/register"))
            .json(&json!({
                "name": name,
                "email": email,
                "password": password,
                "password_confirmation": password_confirmation,
            }))
            .send()
            .await?;

        let auth: AuthResponse = Self::read(resp).await?;
        debug!(user_id = auth.user.id, "registered");
        session.sign_in(auth.user.clone(), auth.token);
        Ok(auth.user)
    }

    pub async fn login(
        &self,
        session: &mut Session,
        email: &str,
        password: &str,
    ) -> Result<User, BlogClientError> {
        let resp = self
            .client
            .post(self.url("/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let auth: AuthResponse = Self::read(resp).await?;
        debug!(user_id = auth.user.id, "logged in");
        session.sign_in(auth.user.clone(), auth.token);
        Ok(auth.user)
    }

    /// Revokes the session's token on the server. The session is cleared
    /// even when the server cannot be reached.
    pub async fn logout(&self, session: &mut Session) -> Result<(), BlogClientError> {
        if !session.is_authenticated() {
            session.clear();
            return Ok(());
        }

        let req = self.authorized(self.client.post(self.url("/logout")), session);
        let outcome = match req.send().await {
            Ok(resp) if resp.status().is_success() => Ok(()),
            Ok(resp) => Err(BlogClientError::from_http_response(resp).await),
            Err(err) => Err(err.into()),
        };
        session.clear();

        match outcome {
            // The token was already gone server-side.
            Err(BlogClientError::Unauthorized) => Ok(()),
            Err(err) => {
                warn!(error = %err, "logout request failed");
                Err(err)
            }
            ok => ok,
        }
    }

    pub async fn me(&self, session: &Session) -> Result<User, BlogClientError> {
        let resp = self
            .authorized(self.client.get(self.url("/me")), session)
            .send()
            .await?;
        Self::read(resp).await
    }

    pub async fn list_posts(
        &self,
        session: &Session,
        query: &PostQuery,
    ) -> Result<Vec<Post>, BlogClientError> {
        let resp = self
            .authorized(self.client.get(self.url("/posts")).query(query), session)
            .send()
            .await?;
        let body: DataEnvelope<Vec<Post>> = Self::read(resp).await?;
        Ok(body.data)
    }

    pub async fn get_post(&self, session: &Session, id: i64) -> Result<Post, BlogClientError> {
        let resp = self
            .authorized(self.client.get(self.url(&format!("/posts/{id}"))), session)
            .send()
            .await?;
        let body: DataEnvelope<Post> = Self::read(resp).await?;
        Ok(body.data)
    }

    pub async fn create_post(
        &self,
        session: &Session,
        post: &NewPost,
    ) -> Result<Post, BlogClientError> {
        let resp = self
            .authorized(self.client.post(self.url("/posts")).json(post), session)
            .send()
            .await?;
        let body: DataEnvelope<Post> = Self::read(resp).await?;
        Ok(body.data)
    }

    pub async fn update_post(
        &self,
        session: &Session,
        id: i64,
        changes: &PostChanges,
    ) -> Result<Post, BlogClientError> {
        let resp = self
            .authorized(
                self.client.put(self.url(&format!("/posts/{id}"))).json(changes),
                session,
            )
            .send()
            .await?;
        let body: DataEnvelope<Post> = Self::read(resp).await?;
        Ok(body.data)
    }

    pub async fn delete_post(&self, session: &Session, id: i64) -> Result<(), BlogClientError> {
        let resp = self
            .authorized(self.client.delete(self.url(&format!("/posts/{id}"))), session)
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(BlogClientError::from_http_response(resp).await)
        }
    }
}
