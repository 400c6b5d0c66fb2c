//! # Audit Subcommand
//!
//! Runs the closed-shape audit over every contract of the deployment.
//! Any finding means some object schema accepts undeclared keys.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use bucket_schema::{ContractRegistry, OpenShapeFinding};

/// Arguments for the `bucket audit` subcommand.
#[derive(Args, Debug)]
pub struct AuditArgs {}

/// Execute the audit subcommand.
///
/// Returns exit code: 0 when every contract is closed, 1 otherwise.
pub fn run_audit(_args: &AuditArgs, registry: &ContractRegistry) -> Result<u8> {
    let findings = registry.audit();
    tracing::info!(
        contracts = registry.contracts().len(),
        findings = findings.len(),
        "closed-shape audit finished"
    );
    write_findings(registry.contracts().len(), &findings, &mut std::io::stdout().lock())?;
    Ok(u8::from(!findings.is_empty()))
}

fn write_findings(
    contracts: usize,
    findings: &[(String, OpenShapeFinding)],
    out: &mut impl Write,
) -> Result<()> {
    if findings.is_empty() {
        writeln!(out, "Contracts: {contracts}/{contracts} closed")?;
        return Ok(());
    }
    for (contract, finding) in findings {
        writeln!(out, "FAIL: {contract}")?;
        writeln!(out, "{finding}")?;
    }
    writeln!(out, "\n{} open shape(s) across {contracts} contract(s).", findings.len())?;
    Ok(())
}
