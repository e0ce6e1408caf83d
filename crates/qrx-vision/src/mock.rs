//! Mock detector and decoder for deterministic testing.
//!
//! Both are scripted: queue per-call outputs up front, then assert on call
//! counts afterwards. When a script runs dry the detector emits no regions
//! and the decoder reports a miss, so unscripted calls stay harmless.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use qrx_core::{Error, PageImage, Region, RegionDecoder, RegionDetector, Result};

/// Scripted region detector.
#[derive(Clone, Default)]
pub struct MockDetector {
    script: Arc<Mutex<VecDeque<Vec<Region>>>>,
    calls: Arc<Mutex<usize>>,
}

impl MockDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the regions the next unscripted page will produce.
    pub fn with_page_regions(self, regions: Vec<Region>) -> Self {
        self.script.lock().unwrap().push_back(regions);
        self
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl RegionDetector for MockDetector {
    async fn detect(&self, page: &PageImage) -> Result<Vec<Region>> {
        *self.calls.lock().unwrap() += 1;
        let regions = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();
        Ok(regions
            .into_iter()
            .map(|r| r.clamped(page.width(), page.height()))
            .collect())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "mock-detector"
    }
}

/// Scripted region decoder.
#[derive(Clone, Default)]
pub struct MockDecoder {
    script: Arc<Mutex<VecDeque<Option<String>>>>,
    calls: Arc<Mutex<Vec<(u32, u32)>>>,
    fail: bool,
}

impl MockDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A decoder whose every call is a hard backend failure.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Queue the outcome of the next unscripted decode call.
    pub fn with_result(self, result: Option<&str>) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(result.map(str::to_string));
        self
    }

    /// Dimensions of every crop this decoder has seen, in call order.
    pub fn seen_crops(&self) -> Vec<(u32, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RegionDecoder for MockDecoder {
    async fn decode(&self, region: &PageImage) -> Result<Option<String>> {
        self.calls
            .lock()
            .unwrap()
            .push((region.width(), region.height()));
        if self.fail {
            return Err(Error::Decode("mock decoder failure".to_string()));
        }
        Ok(self.script.lock().unwrap().pop_front().flatten())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.fail)
    }

    fn name(&self) -> &str {
        "mock-decoder"
    }
}
