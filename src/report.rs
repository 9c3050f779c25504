//! Report rendering.
//!
//! Renders a [`TestReport`] as human-readable text or as JSON.

#![allow(clippy::missing_errors_doc)]

use crate::analysis::types::{ClientIdentity, NetworkDetails};
use crate::analysis::LeakStatus;
use crate::error::Result;
use crate::probe::{PhaseSummary, ProbeStatus};
use crate::session::TestReport;
use std::io::Write;

/// Write the report as text.
pub fn render_text<W: Write>(report: &TestReport, w: &mut W) -> Result<()> {
    writeln!(
        w,
        "== DNS leak test ({}) started {} ==",
        report.mode,
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(w, "Test ID: {}", report.test_id)?;
    writeln!(w)?;

    render_client(report.client.as_ref(), w)?;
    render_probe_summary(report, w)?;
    render_leak(report, w)?;

    if let Some(rebinding) = &report.rebinding {
        writeln!(w)?;
        writeln!(w, "== DNS rebinding ==")?;
        writeln!(w, "Status: {}", rebinding.status.to_string().to_uppercase())?;
        writeln!(w, "{}", rebinding.message)?;
    }

    writeln!(w)?;
    writeln!(w, "Total HTTP requests in the test: {}", report.total_requests())?;
    Ok(())
}

/// Write the report as pretty-printed JSON.
pub fn render_json<W: Write>(report: &TestReport, w: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *w, report)?;
    writeln!(w)?;
    Ok(())
}

fn render_client<W: Write>(client: Option<&ClientIdentity>, w: &mut W) -> Result<()> {
    let Some(client) = client else {
        writeln!(w, "Client data: no data.")?;
        writeln!(w)?;
        return Ok(());
    };

    writeln!(w, "== Client data ==")?;
    write!(w, "IP: {}", client.ip)?;
    if client.is_vpn {
        write!(w, "  (VPN detected)")?;
    }
    writeln!(w)?;
    render_details(&client.details, "", w)?;
    writeln!(w)?;
    Ok(())
}

fn render_details<W: Write>(details: &NetworkDetails, indent: &str, w: &mut W) -> Result<()> {
    if let Some(location) = details.location() {
        writeln!(w, "{indent}Location: {location}")?;
    }
    if let Some(isp) = &details.isp {
        writeln!(w, "{indent}ISP: {isp}")?;
    }
    if let Some(asn) = &details.asn {
        writeln!(w, "{indent}ASN: {asn}")?;
    }
    if let Some((lat, long)) = details.coordinates() {
        writeln!(w, "{indent}GPS: {lat:.4}, {long:.4}")?;
    }
    Ok(())
}

fn render_probe_summary<W: Write>(report: &TestReport, w: &mut W) -> Result<()> {
    writeln!(w, "== Probe summary ==")?;
    for (label, results) in [("Phase 1", &report.phase1), ("Phase 2", &report.phase2)] {
        let summary = PhaseSummary::from_results(results);
        let counts: Vec<String> = ProbeStatus::ALL
            .iter()
            .map(|status| format!("{status}={}", summary.count(*status)))
            .collect();
        writeln!(
            w,
            "{label}: {} request(s) ({})",
            summary.total,
            counts.join(", ")
        )?;
    }
    writeln!(w)?;
    Ok(())
}

fn render_leak<W: Write>(report: &TestReport, w: &mut W) -> Result<()> {
    let leak = &report.leak;
    writeln!(w, "== DNS leak / DNS servers ==")?;

    if leak.status == LeakStatus::Undetermined {
        writeln!(w, "{}", leak.message)?;
        return Ok(());
    }

    writeln!(
        w,
        "Found {} unique DNS server(s), DNS providers: {}",
        leak.unique_servers.len(),
        leak.provider_count()
    )?;
    writeln!(w)?;

    for server in &leak.unique_servers {
        write!(w, "- {}", server.ip)?;
        if server.is_vpn {
            write!(w, "  [VPN / proxy]")?;
        }
        writeln!(w)?;
        render_details(&server.details, "    ", w)?;
    }

    if let Some(avg) = report.average_success {
        writeln!(w)?;
        writeln!(
            w,
            "Average time for a successful HTTP request: {:.2} ms",
            avg.as_secs_f64() * 1000.0
        )?;
    }

    writeln!(w)?;
    writeln!(w, "DNS leak verdict: {}", leak.message)?;
    Ok(())
}
