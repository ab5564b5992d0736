use super::DocumentSource;
use crate::config::ConnectionConfig;
use crate::dispatch::EngineKind;
use anyhow::anyhow;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::{ClientOptions, Credential, ServerAddress};
use mongodb::Client;
use std::ops::Deref;
use tracing::debug;

pub struct MongoDb {
    config: ConnectionConfig,
    client: Option<Client>,
}

impl Deref for MongoDb {
    type Target = ConnectionConfig;

    fn deref(&self) -> &Self::Target {
        &self.config
    }
}

impl MongoDb {
    pub fn new(config: &ConnectionConfig) -> Self {
        MongoDb {
            config: config.clone(),
            client: None,
        }
    }

    fn client(&self) -> anyhow::Result<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| anyhow!("MongoDB client is not connected"))
    }

    fn client_options(&self) -> ClientOptions {
        let mut options = ClientOptions::default();
        options.hosts = vec![ServerAddress::Tcp {
            host: self.host.clone(),
            port: Some(self.port_for(EngineKind::DocumentStore)),
        }];
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
        if let Some(username) = &self.username {
            let mut credential = Credential::default();
            credential.username = Some(username.clone());
            credential.password = self.password.clone();
            options.credential = Some(credential);
        }
        options
    }
}

#[async_trait::async_trait]
impl DocumentSource for MongoDb {
    async fn open(&mut self) -> anyhow::Result<()> {
        let client = Client::with_options(self.client_options())?;
        // 驱动是惰性连接的，先 ping 一次确认连接和认证
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        debug!("Connected to MongoDB at {}", self.host);
        self.client = Some(client);
        Ok(())
    }

    async fn list_database_names(&mut self) -> anyhow::Result<Vec<String>> {
        Ok(self.client()?.list_database_names().await?)
    }

    async fn list_collection_names(&mut self, database: &str) -> anyhow::Result<Vec<String>> {
        Ok(self
            .client()?
            .database(database)
            .list_collection_names()
            .await?)
    }

    async fn fetch_all(
        &mut self,
        database: &str,
        collection: &str,
    ) -> anyhow::Result<Vec<serde_json::Value>> {
        let cursor = self
            .client()?
            .database(database)
            .collection::<Document>(collection)
            .find(doc! {})
            .await?;
        let documents: Vec<Document> = cursor.try_collect().await?;

        Ok(documents
            .into_iter()
            .map(|document| Bson::Document(document).into_relaxed_extjson())
            .collect())
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        if let Some(client) = self.client.take() {
            client.shutdown().await;
        }
        Ok(())
    }
}
