//! Render and edit orchestration.
//!
//! A submission is priced, checked against the usage ledger, dispatched to
//! the generation service and, only on success, counted and logged. Usage
//! and history are persisted independently; a failed write is logged and
//! does not fail the submission.

use crate::config::Config;
use crate::error::{AtomError, Result};
use crate::history::HistoryLog;
use crate::ledger;
use crate::mask::RegionMask;
use crate::pricing::CostModel;
use crate::service::{EditCall, GenerationService, RenderCall};
use crate::store::KeyValueStore;
use crate::types::{
    AspectRatio, Cost, ImageBlob, ModelTier, OperationKind, RenderHistoryItem, RenderId,
    RenderRequestSpec, SizeTier, UsageStats,
};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

const DEFAULT_RECORDED_PROMPT: &str = "Render";
const DEFAULT_STYLE_PROMPT: &str = "Architectural render";
const EDIT_PREFIX: &str = "[Edit] ";

pub struct Studio {
    store: Arc<dyn KeyValueStore>,
    service: Arc<dyn GenerationService>,
    cost_model: CostModel,
    daily_limit: u32,
    usage: UsageStats,
    history: HistoryLog,
    spec: RenderRequestSpec,
    aspect_ratio: AspectRatio,
}

impl Studio {
    /// Load usage and history from `store`, resetting an expired window
    pub fn open(
        store: Arc<dyn KeyValueStore>,
        service: Arc<dyn GenerationService>,
        config: &Config,
        now: DateTime<Utc>,
    ) -> Self {
        let usage = ledger::load_or_init(store.as_ref(), now);
        let history = HistoryLog::load(store.as_ref());
        debug!(
            render_count = usage.render_count,
            history = history.len(),
            "studio opened"
        );

        Self {
            store,
            service,
            cost_model: config.cost_model(),
            daily_limit: config.daily_free_limit,
            usage,
            history,
            spec: RenderRequestSpec::default(),
            aspect_ratio: AspectRatio::default(),
        }
    }

    pub fn usage(&self) -> &UsageStats {
        &self.usage
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn spec(&self) -> RenderRequestSpec {
        self.spec
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    /// Switching to free downgrades sizes above Full HD
    pub fn set_tier(&mut self, tier: ModelTier) {
        self.spec = self.spec.with_tier(tier);
    }

    pub fn set_size(&mut self, size: SizeTier) {
        self.spec = self.spec.with_size(size);
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: AspectRatio) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Price of the next submission of the given kind
    pub fn quote(&self, operation: OperationKind) -> Cost {
        self.cost_model.cost_of(&self.spec.with_operation(operation))
    }

    pub fn is_admitted(&self) -> bool {
        ledger::is_admitted(&self.usage, self.spec.tier(), self.daily_limit)
    }

    pub fn remaining_free_renders(&self) -> u32 {
        ledger::remaining_free_renders(&self.usage, self.daily_limit)
    }

    pub fn time_until_reset(&self, now: DateTime<Utc>) -> Duration {
        ledger::time_until_reset(&self.usage, now)
    }

    /// Start a new window if the current one has run out
    pub fn refresh_window(&mut self, now: DateTime<Utc>) {
        if self.usage.is_expired(now) {
            debug!(last_reset = %self.usage.last_reset, "usage window expired, resetting");
            self.usage = UsageStats::fresh(now);
            self.persist_usage();
        }
    }

    fn admit(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.refresh_window(now);
        if self.is_admitted() {
            Ok(())
        } else {
            Err(AtomError::QuotaExceeded {
                limit: self.daily_limit,
            })
        }
    }

    /// Render a sketch. An empty prompt is sent as a generic style and recorded as `Render`.
    pub async fn render(
        &mut self,
        sketch: ImageBlob,
        prompt: &str,
        now: DateTime<Utc>,
    ) -> Result<RenderHistoryItem> {
        self.admit(now)?;
        let spec = self.spec.with_operation(OperationKind::Create);
        let cost = self.cost_model.cost_of(&spec);

        let prompt = prompt.trim();
        let call = RenderCall {
            prompt: if prompt.is_empty() {
                DEFAULT_STYLE_PROMPT.to_string()
            } else {
                prompt.to_string()
            },
            sketch,
            size: spec.size(),
            aspect_ratio: self.aspect_ratio,
            tier: spec.tier(),
        };

        let image = self.service.render(&call).await.inspect_err(|e| {
            warn!(error = %e, "render failed");
        })?;

        let recorded = if prompt.is_empty() {
            DEFAULT_RECORDED_PROMPT
        } else {
            prompt
        };
        Ok(self.commit(&image, recorded.to_string(), cost, now))
    }

    /// Edit a previous result. Empty masks are not sent.
    pub async fn edit(
        &mut self,
        base_image: ImageBlob,
        prompt: &str,
        mask: Option<&RegionMask>,
        now: DateTime<Utc>,
    ) -> Result<RenderHistoryItem> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AtomError::invalid("edit prompt is empty"));
        }
        self.admit(now)?;

        let spec = self.spec.with_operation(OperationKind::Edit);
        let cost = self.cost_model.cost_of(&spec);
        let mask = mask
            .filter(|m| !m.is_empty())
            .map(RegionMask::to_blob)
            .transpose()?;

        let call = EditCall {
            base_image,
            prompt: prompt.to_string(),
            mask,
            aspect_ratio: self.aspect_ratio,
        };

        let image = self.service.edit(&call).await.inspect_err(|e| {
            warn!(error = %e, "edit failed");
        })?;

        Ok(self.commit(&image, format!("{}{}", EDIT_PREFIX, prompt), cost, now))
    }

    /// Text-to-image. Not metered and not recorded in history.
    pub async fn imagine(&self, prompt: &str) -> Result<ImageBlob> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AtomError::invalid("prompt is empty"));
        }
        self.service.generate_from_text(prompt).await
    }

    fn commit(
        &mut self,
        image: &ImageBlob,
        prompt: String,
        cost: Cost,
        now: DateTime<Utc>,
    ) -> RenderHistoryItem {
        let item = RenderHistoryItem {
            id: RenderId::from_timestamp(now),
            prompt,
            size: self.spec.size(),
            image_url: image.to_data_url(),
            timestamp: now,
            cost,
            aspect_ratio: Some(self.aspect_ratio),
            model_tier: Some(self.spec.tier()),
        };

        self.usage = ledger::record_usage(self.usage, cost);
        self.history.prepend(item.clone());
        self.persist_usage();
        self.persist_history();

        info!(id = %item.id, cost = %item.cost, render_count = self.usage.render_count, "render recorded");
        item
    }

    fn persist_usage(&self) {
        if let Err(e) = ledger::save(self.store.as_ref(), &self.usage) {
            warn!(error = %e, "could not persist usage stats");
        }
    }

    fn persist_history(&self) {
        if let Err(e) = self.history.save(self.store.as_ref()) {
            warn!(error = %e, "could not persist render history");
        }
    }
}
