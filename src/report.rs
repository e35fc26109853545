//! Result export: flat records, summary statistics and a JSON sink.
//!
//! Rendering into CSV, Markdown or HTML is left to external tools; the JSON
//! document written by [`write_json`] carries everything they need.

use crate::analyze::{self, AnalysisKind};
use crate::engine::{FuzzResult, RunStatus, ServerStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

/// One [`FuzzResult`] as plain key/value data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub test_id: String,
    pub test_name: String,
    pub description: String,
    /// Hex-encoded payload.
    pub packet_sent: String,
    pub packet_length: usize,
    /// Hex-encoded response; absent when nothing was read.
    pub response_received: Option<String>,
    pub response_length: usize,
    pub server_status: String,
    pub analysis: String,
    pub result_code: Option<u64>,
    pub result_name: Option<String>,
    /// Milliseconds, rounded to two decimals.
    pub response_time_ms: f64,
    pub error_message: Option<String>,
    pub timestamp: f64,
}

impl From<&FuzzResult> for ResultRecord {
    fn from(r: &FuzzResult) -> Self {
        let analysis = analyze::analyze_response(r.response.as_deref());
        ResultRecord {
            test_id: r.test_id.clone(),
            test_name: r.test_name.clone(),
            description: r.description.clone(),
            packet_sent: hex::encode(&r.packet_sent),
            packet_length: r.packet_sent.len(),
            response_received: r.response.as_ref().map(hex::encode),
            response_length: r.response.as_ref().map_or(0, Vec::len),
            server_status: r.status.to_string(),
            analysis: analysis.kind.to_string(),
            result_code: analysis.result_code,
            result_name: analysis.result_code.and_then(analyze::result_code_name).map(str::to_string),
            response_time_ms: (r.response_time.as_secs_f64() * 100_000.0).round() / 100.0,
            error_message: r.error.clone(),
            timestamp: r.timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub status_counts: BTreeMap<String, usize>,
    pub result_code_counts: BTreeMap<u64, usize>,
    pub malformed_responses: usize,
    pub avg_response_ms: f64,
    pub min_response_ms: f64,
    pub max_response_ms: f64,
}

impl Summary {
    pub fn from_results(results: &[FuzzResult]) -> Self {
        let mut status_counts = BTreeMap::new();
        for status in ServerStatus::ALL {
            let n = results.iter().filter(|r| r.status == status).count();
            if n > 0 {
                status_counts.insert(status.to_string(), n);
            }
        }

        let mut result_code_counts = BTreeMap::new();
        let mut malformed_responses = 0;
        for r in results {
            let analysis = analyze::analyze_response(r.response.as_deref());
            if let Some(code) = analysis.result_code {
                *result_code_counts.entry(code).or_insert(0) += 1;
            }
            if analysis.kind == AnalysisKind::Malformed {
                malformed_responses += 1;
            }
        }

        let times: Vec<f64> = results.iter().map(|r| r.response_time.as_secs_f64() * 1000.0).collect();
        let (avg, min, max) = if times.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                times.iter().sum::<f64>() / times.len() as f64,
                times.iter().copied().fold(f64::INFINITY, f64::min),
                times.iter().copied().fold(0.0, f64::max),
            )
        };

        Summary {
            total: results.len(),
            status_counts,
            result_code_counts,
            malformed_responses,
            avg_response_ms: avg,
            min_response_ms: min,
            max_response_ms: max,
        }
    }
}

/// Top-level JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct Report<'a> {
    pub target: String,
    pub mode: String,
    pub status: &'a RunStatus,
    pub summary: Summary,
    pub results: Vec<ResultRecord>,
}

impl<'a> Report<'a> {
    pub fn new(target: impl Into<String>, mode: impl Into<String>, status: &'a RunStatus, results: &[FuzzResult]) -> Self {
        Report {
            target: target.into(),
            mode: mode.into(),
            status,
            summary: Summary::from_results(results),
            results: results.iter().map(ResultRecord::from).collect(),
        }
    }
}

pub fn write_json<W: Write>(report: &Report<'_>, writer: W) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, report)
}
