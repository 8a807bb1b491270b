//! Packages a failure case with the current prompts and delivers it to the
//! configured webhook, caching whatever comes back.

use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};

use reqwest::{header::CONTENT_TYPE, Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::ResultCache;
use crate::config::Config;
use crate::notify::Notifier;
use crate::prompts::PromptSet;
use crate::result::{now_iso, parse_body, ExecutionResult, SubmitMethod};
use crate::stats::{AnalysisHistory, AnalysisRecord};
use crate::store::{SharedStore, StoreError};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("destination URL is required")]
    MissingUrl,
    #[error("destination URL '{0}' is not a valid http(s) URL")]
    InvalidUrl(String),
    #[error("failure description is required")]
    MissingDescription,
    #[error("a submission is already in progress")]
    InFlight,
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Raw form fields as typed by the analyst.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseForm {
    pub duration_minutes: String,
    pub reduction_percent: String,
    pub estimated_cost: String,
    pub hourly_revenue: String,
    pub description: String,
    pub equipment_tag: String,
    pub asset_number: String,
}

impl CaseForm {
    /// A real reducer failure, handy for trying the pipeline end to end.
    pub fn example() -> Self {
        Self {
            duration_minutes: "78".into(),
            reduction_percent: "0".into(),
            estimated_cost: "0".into(),
            hourly_revenue: "0".into(),
            description: "Ruptura dos parafusos responsáveis pela fixação do redutor do decantador 06, que resultou na parada do equipamento. Histórico indica recorrência em safras anteriores. TAG: 351MR06 | Patrimônio: RD-08.009113. Ocorrência com ~78 min de indisponibilidade setorial. Observou-se acúmulo de impurezas/minerais ao longo dos anos e possíveis falhas de proteção/sobrecarga.".into(),
            equipment_tag: "351MR06".into(),
            asset_number: "RD-08.009113".into(),
        }
    }

    pub fn payload(&self) -> CasePayload {
        CasePayload {
            dur_min: parse_int_prefix(&self.duration_minutes),
            reducao_pct: parse_float_prefix(&self.reduction_percent),
            custo: parse_float_prefix(&self.estimated_cost),
            faturamento_1h: parse_float_prefix(&self.hourly_revenue),
            descricao: self.description.clone(),
            tag: self.equipment_tag.clone(),
            patrimonio: self.asset_number.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CasePayload {
    pub dur_min: i64,
    pub reducao_pct: f64,
    pub custo: f64,
    pub faturamento_1h: f64,
    pub descricao: String,
    pub tag: String,
    pub patrimonio: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    pub prompts: PromptSet,
    pub payload: CasePayload,
}

/// Validates the inputs and assembles the body; nothing is read from or written to storage.
pub fn build_request(url: &str, form: &CaseForm, prompts: &PromptSet) -> Result<(Url, RequestBody), SubmitError> {
    let parsed = validate_url(url)?;
    if form.description.trim().is_empty() {
        return Err(SubmitError::MissingDescription);
    }
    Ok((parsed, RequestBody { prompts: prompts.clone(), payload: form.payload() }))
}

pub fn validate_url(url: &str) -> Result<Url, SubmitError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(SubmitError::MissingUrl);
    }
    let parsed = Url::parse(url).map_err(|_| SubmitError::InvalidUrl(url.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SubmitError::InvalidUrl(url.to_string()));
    }
    Ok(parsed)
}

/// Leading integer of `s` (after whitespace, optional sign); 0 when there is none.
pub fn parse_int_prefix(s: &str) -> i64 {
    let s = s.trim_start();
    let sign_len = usize::from(s.starts_with(['+', '-']));
    let digits = s[sign_len..].chars().take_while(char::is_ascii_digit).count();
    s[..sign_len + digits].parse().unwrap_or(0)
}

/// Longest leading decimal number of `s`; 0 when there is none or it is not finite.
pub fn parse_float_prefix(s: &str) -> f64 {
    let s = s.trim_start();
    let candidate_len = s
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        .count();
    (1..=candidate_len)
        .rev()
        .find_map(|len| s[..len].parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

const FORM_TIMEOUT: Duration = Duration::from_secs(5);

struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, SubmitError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| SubmitError::InFlight)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Submitter {
    http: Client,
    cache: ResultCache,
    history: AnalysisHistory,
    notifier: Notifier,
    form_timeout: Duration,
    in_flight: AtomicBool,
}

impl Submitter {
    pub fn new(http: Client, cache: ResultCache, history: AnalysisHistory, notifier: Notifier) -> Self {
        Self { http, cache, history, notifier, form_timeout: FORM_TIMEOUT, in_flight: AtomicBool::new(false) }
    }

    /// Caps how long the form path waits once the request is out; its response is never read.
    pub fn with_form_timeout(mut self, timeout: Duration) -> Self {
        self.form_timeout = timeout;
        self
    }

    pub fn from_config(cfg: &Config, store: SharedStore, notifier: Notifier) -> Result<Self, SubmitError> {
        let http = Client::builder().timeout(cfg.request_timeout()).build()?;
        Ok(Self::new(
            http,
            ResultCache::new(store.clone()),
            AnalysisHistory::new(store, cfg.history_length()),
            notifier,
        )
        .with_form_timeout(cfg.form_timeout()))
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Delivers one case. Validation and storage failures are errors; a failed
    /// call is not: it comes back as a cached result with `success == false`.
    pub async fn submit(
        &self,
        method: SubmitMethod,
        url: &str,
        form: &CaseForm,
        prompts: &PromptSet,
    ) -> Result<ExecutionResult, SubmitError> {
        let (url, body) = build_request(url, form, prompts)?;
        let _guard = InFlightGuard::acquire(&self.in_flight)?;
        match method {
            SubmitMethod::Fetch => self.send_direct(url, &body).await,
            SubmitMethod::Form => self.send_form(url, &body).await,
        }
    }

    async fn send_direct(&self, url: Url, body: &RequestBody) -> Result<ExecutionResult, SubmitError> {
        info!(%url, "sending case to webhook");
        let started = Instant::now();
        let outcome = async {
            let resp = self.http.post(url.clone()).json(body).send().await?;
            let status = resp.status().as_u16();
            let content_type = resp
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let text = resp.text().await?;
            Ok::<_, reqwest::Error>((status, content_type, text))
        }
        .await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let result = match outcome {
            Ok((status, content_type, text)) => {
                debug!(status, len = text.len(), %content_type, "webhook responded");
                ExecutionResult::fetched(status, parse_body(&text), content_type)
            }
            Err(err) => {
                warn!(error = %err, "webhook call failed");
                ExecutionResult::transport_failure(err.to_string())
            }
        };

        self.cache.write(&result)?;
        if let Err(err) = self.history.append(AnalysisRecord {
            timestamp: result.timestamp.clone().unwrap_or_else(now_iso),
            success: result.success,
            status: result.status,
            processing_time: elapsed_ms,
        }) {
            warn!(error = %err, "failed to record analysis history");
        }
        self.notifier.completed(result.success, result.status);
        info!(success = result.success, status = result.status, "submission finished");
        Ok(result)
    }

    async fn send_form(&self, url: Url, body: &RequestBody) -> Result<ExecutionResult, SubmitError> {
        // The outcome of this path is never observed, so the record is optimistic.
        let result = ExecutionResult::form_dispatched();
        self.cache.write(&result)?;
        warn!(%url, "form delivery recorded as successful before any response; outcome is unconfirmed");

        let encoded = serde_json::to_string(body)?;
        let sent = self
            .http
            .post(url)
            .timeout(self.form_timeout)
            .form(&[("payload", encoded)])
            .send()
            .await;
        match sent {
            Ok(resp) => debug!(status = resp.status().as_u16(), "form delivery response discarded"),
            Err(err) => debug!(error = %err, "form delivery error discarded"),
        }
        Ok(result)
    }
}
