//! Recording doubles for the observability collaborators.

use std::sync::{Arc, Mutex, MutexGuard};

use users_observability::{
    ActiveSpan, MetricLabels, MetricsBackend, MetricsError, SpanValue, TraceContextProvider,
};

/// One call made against [`RecordingMetrics`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedMetric {
    pub name: &'static str,
    pub labels: Vec<(&'static str, String)>,
    /// `None` for counter increments.
    pub value: Option<f64>,
}

impl RecordedMetric {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Default)]
pub struct RecordingMetrics {
    calls: Mutex<Vec<RecordedMetric>>,
}

impl RecordingMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RecordedMetric>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn calls(&self) -> Vec<RecordedMetric> {
        self.lock().clone()
    }

    pub fn counters(&self, name: &str) -> Vec<RecordedMetric> {
        self.lock()
            .iter()
            .filter(|c| c.name == name && c.value.is_none())
            .cloned()
            .collect()
    }

    pub fn histograms(&self, name: &str) -> Vec<RecordedMetric> {
        self.lock()
            .iter()
            .filter(|c| c.name == name && c.value.is_some())
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl MetricsBackend for RecordingMetrics {
    fn increment_counter(&self, name: &'static str, labels: &MetricLabels) -> Result<(), MetricsError> {
        self.lock().push(RecordedMetric {
            name,
            labels: labels.to_vec(),
            value: None,
        });
        Ok(())
    }

    fn observe_histogram(
        &self,
        name: &'static str,
        labels: &MetricLabels,
        value: f64,
    ) -> Result<(), MetricsError> {
        self.lock().push(RecordedMetric {
            name,
            labels: labels.to_vec(),
            value: Some(value),
        });
        Ok(())
    }
}

/// Everything written to the recorded span.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedSpan {
    pub attributes: Vec<(&'static str, SpanValue)>,
    pub events: Vec<(&'static str, Vec<(&'static str, SpanValue)>)>,
    pub error_status: Option<String>,
}

impl RecordedSpan {
    pub fn attribute(&self, key: &str) -> Option<&SpanValue> {
        self.attributes
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    pub fn event_names(&self) -> Vec<&'static str> {
        self.events.iter().map(|(name, _)| *name).collect()
    }
}

/// Trace provider whose single span is shared by every request, or absent
/// when built with [`RecordingTraceProvider::inactive`].
#[derive(Debug, Clone)]
pub struct RecordingTraceProvider {
    trace_id: Option<String>,
    span: Arc<Mutex<RecordedSpan>>,
}

pub const RECORDED_TRACE_ID: &str = "4bf92f3577b34da6a3ce929d0e0e4736";

impl RecordingTraceProvider {
    pub fn active() -> Arc<Self> {
        Arc::new(Self {
            trace_id: Some(RECORDED_TRACE_ID.to_string()),
            span: Arc::default(),
        })
    }

    pub fn inactive() -> Arc<Self> {
        Arc::new(Self {
            trace_id: None,
            span: Arc::default(),
        })
    }

    pub fn span(&self) -> RecordedSpan {
        self.span
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_untouched(&self) -> bool {
        self.span() == RecordedSpan::default()
    }
}

impl TraceContextProvider for RecordingTraceProvider {
    fn current_span(&self) -> Option<Box<dyn ActiveSpan>> {
        let trace_id = self.trace_id.clone()?;
        Some(Box::new(RecordingSpan {
            trace_id,
            span: self.span.clone(),
        }))
    }
}

struct RecordingSpan {
    trace_id: String,
    span: Arc<Mutex<RecordedSpan>>,
}

impl RecordingSpan {
    fn lock(&self) -> MutexGuard<'_, RecordedSpan> {
        self.span.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ActiveSpan for RecordingSpan {
    fn trace_id(&self) -> String {
        self.trace_id.clone()
    }

    fn set_attribute(&self, key: &'static str, value: SpanValue) {
        self.lock().attributes.push((key, value));
    }

    fn add_event(&self, name: &'static str, attributes: Vec<(&'static str, SpanValue)>) {
        self.lock().events.push((name, attributes));
    }

    fn mark_error(&self, message: &str) {
        self.lock().error_status = Some(message.to_string());
    }
}
