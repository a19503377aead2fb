use super::{About, DriveClient, Result};

const ABOUT_FIELDS: &str = "user(displayName, emailAddress), storageQuota(limit, usage)";

impl DriveClient {
    /// user and quota of the authenticated account
    pub async fn about(&self) -> Result<About> {
        let req = self
            .client
            .get(format!("{}/drive/v3/about", self.base_url))
            .query(&[("fields", ABOUT_FIELDS)]);
        Ok(self.send(req).await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::ABOUT_FIELDS;
    use crate::drive::tests::client_for;
    use mockito::Matcher;

    #[tokio::test]
    async fn reads_user_and_quota() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/drive/v3/about")
            .match_query(Matcher::UrlEncoded("fields".into(), ABOUT_FIELDS.into()))
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"user": {"displayName": "Ada", "emailAddress": "ada@example.com"},
                    "storageQuota": {"limit": "16106127360", "usage": "1024"}}"#,
            )
            .create_async()
            .await;

        let about = client_for(&server).about().await.unwrap();
        assert_eq!(about.user.email_address.as_deref(), Some("ada@example.com"));
        assert_eq!(about.storage_quota.unwrap().usage.as_deref(), Some("1024"));
    }
}
