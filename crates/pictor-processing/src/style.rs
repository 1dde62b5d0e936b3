//! Named style resolution.
//!
//! A style request (`["style", name]`) looks the name up in the KV store and
//! re-dispatches the persisted chain over an inner registry. The inner
//! registry has no style processor registered, so persisted chains cannot
//! reference other styles.

use std::sync::Arc;

use async_trait::async_trait;
use pictor_core::{validate_style_name, AppError, AppResult};
use pictor_storage::{BufferStore, KvStore};
use tracing::debug;

use crate::chain::split_chain;
use crate::processor::{Processor, ProcessorRegistry, ProcessResponse};

pub struct StyleProcessor {
    kv: Arc<dyn KvStore>,
    inner: Arc<ProcessorRegistry>,
}

impl StyleProcessor {
    pub fn new(kv: Arc<dyn KvStore>, inner: Arc<ProcessorRegistry>) -> Self {
        Self { kv, inner }
    }
}

#[async_trait]
impl Processor for StyleProcessor {
    fn name(&self) -> &'static str {
        "style"
    }

    async fn execute(
        &self,
        uri: &str,
        actions: &[String],
        store: Arc<dyn BufferStore>,
    ) -> AppResult<ProcessResponse> {
        if actions.len() != 2 {
            return Err(AppError::invalid_argument("Invalid style!"));
        }
        let name = &actions[1];
        validate_style_name(name)?;

        let record = self
            .kv
            .get(name)
            .await?
            .ok_or_else(|| AppError::invalid_argument("Style not found"))?;
        debug!(style = %name, chain = %record.style, "resolved style");

        let chain = split_chain(&record.style);
        self.inner.dispatch(uri, &chain, store).await
    }
}
