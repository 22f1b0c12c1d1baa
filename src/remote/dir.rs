//! Read manifests from a local directory written by the builder

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::PathBuf;

use super::ShardFetcher;
use crate::builder::ROOT_FILE;
use crate::model::{GlobalRoot, Shard, ShardId};
use crate::{Error, Result};

pub struct DirShardFetcher {
    dir: PathBuf,
}

impl DirShardFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirShardFetcher { dir: dir.into() }
    }

    async fn read_json<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>> {
        match tokio::fs::read_to_string(self.dir.join(file)).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

#[async_trait]
impl ShardFetcher for DirShardFetcher {
    async fn fetch_root(&self) -> Result<GlobalRoot> {
        self.read_json(ROOT_FILE).await?.ok_or_else(|| {
            Error::Construction(format!("no {} in {}", ROOT_FILE, self.dir.display()))
        })
    }

    async fn fetch_shard(&self, id: &ShardId) -> Result<Shard> {
        self.read_json(&id.file_name())
            .await?
            .ok_or_else(|| Error::ShardNotFound(id.to_string()))
    }
}
