use std::path::{Path, PathBuf};
use std::sync::Arc;

use aadprobe_client::{GraphClient, InMemoryDirectory};
use aadprobe_config::{load_config, Fixture, Variant};
use aadprobe_domain::{LifecyclePhase, ObjectId, StateSnapshot};
use aadprobe_verifier::{
    run_case, LocalProvisioner, Provisioner, TerraformProvisioner, TestCase, Verifier,
};
use anyhow::{Context, Result};
use tracing::info;

use crate::output;

// ── Verify ────────────────────────────────────────────────────────────────────

pub async fn verify(config: Option<&Path>, object_id: &str, phase: LifecyclePhase) -> Result<()> {
    let verifier = graph_verifier(config)?;
    let id = ObjectId::new(object_id)?;
    verifier.verify(&id, phase).await?;
    println!("ok: application {} is {}", id, phase);
    Ok(())
}

// ── Probe ─────────────────────────────────────────────────────────────────────

pub async fn probe(config: Option<&Path>, object_id: &str) -> Result<()> {
    let verifier = graph_verifier(config)?;
    let id = ObjectId::new(object_id)?;
    let outcome = verifier.classify(&id).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

// ── Render ────────────────────────────────────────────────────────────────────

pub fn render(variant: Variant, id: Option<String>) -> Result<()> {
    let fixture = match id {
        Some(id) => Fixture::new(variant, id),
        None => Fixture::random(variant),
    };
    print!("{}", fixture.render());
    Ok(())
}

// ── State file checks ─────────────────────────────────────────────────────────

pub async fn check_exists(config: Option<&Path>, state: &Path, address: &str) -> Result<()> {
    let snapshot = read_state(state)?;
    let verifier = graph_verifier(config)?;
    let id = aadprobe_verifier::check_exists(&verifier, &snapshot, address).await?;
    println!("ok: {} ({}) exists", address, id);
    Ok(())
}

pub async fn check_destroy(config: Option<&Path>, state: &Path) -> Result<()> {
    let snapshot = read_state(state)?;
    let verifier = graph_verifier(config)?;
    aadprobe_verifier::check_destroy(&verifier, &snapshot).await?;
    println!("ok: no application in {} still exists", state.display());
    Ok(())
}

// ── Run ───────────────────────────────────────────────────────────────────────

pub async fn run(
    config: Option<&Path>,
    case_name: &str,
    workdir: Option<PathBuf>,
    binary: String,
    local: bool,
    json: bool,
) -> Result<()> {
    let case = TestCase::builtin(case_name)
        .with_context(|| format!("unknown test case '{case_name}'"))?;

    let (provisioner, verifier): (Box<dyn Provisioner>, Verifier) = if local {
        let directory = InMemoryDirectory::new();
        let verifier = Verifier::new(Arc::new(directory.clone()));
        (Box::new(LocalProvisioner::new(directory)), verifier)
    } else {
        let probe_config = load_config(config).context("Failed to load probe configuration")?;
        let verifier = Verifier::new(Arc::new(
            GraphClient::new(&probe_config).context("Failed to initialise Graph client")?,
        ));
        let workspace = workdir.unwrap_or_else(|| {
            std::env::temp_dir().join(format!("aadprobe-{}-{}", case_name, uuid::Uuid::new_v4()))
        });
        info!(workspace = %workspace.display(), "using terraform workspace");
        (
            Box::new(TerraformProvisioner::new(binary, workspace, &probe_config)),
            verifier,
        )
    };

    let report = run_case(&case, provisioner.as_ref(), &verifier).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", output::render_report(&report));
    }

    if !report.passed() {
        anyhow::bail!("test case '{}' failed", case_name);
    }
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn graph_verifier(config: Option<&Path>) -> Result<Verifier> {
    let probe_config = load_config(config).context("Failed to load probe configuration")?;
    let client = GraphClient::new(&probe_config).context("Failed to initialise Graph client")?;
    Ok(Verifier::new(Arc::new(client)))
}

fn read_state(path: &Path) -> Result<StateSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file {}", path.display()))?;
    StateSnapshot::from_show_json(&raw)
        .with_context(|| format!("Failed to parse state file {}", path.display()))
}
