//! The build pipeline behind `capec-build`.
//!
//! Every artifact is rendered in memory first. Nothing is written until the
//! gate has passed and every document has rendered. Documents are then staged
//! as temporary files beside their targets and moved into place together; if
//! any move fails, the targets already replaced are restored, so a failed run
//! leaves the output directory as it was.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use capec_codegen::{GenerationReport, SourceTree};
use capec_conformance::{gate, CATALOG_ARTIFACT, WEAKNESS_ARTIFACT};
use capec_ontology::serializer::shell::Shell;
use capec_ontology::serializer::weakness;
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// Inputs and outputs of one build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Catalog document.
    pub input: PathBuf,
    /// Shell template for the catalog artifact.
    pub shell: PathBuf,
    /// Output directory.
    pub out: PathBuf,
    /// XSD for the schema gate, if any.
    pub schema: Option<PathBuf>,
    /// Shell template for the weakness companion, when it should be written.
    pub weaknesses: Option<PathBuf>,
}

/// What a successful build wrote.
#[derive(Debug)]
pub struct BuildOutput {
    /// Counts reported by the generator.
    pub report: GenerationReport,
    /// Files written, in order.
    pub files: Vec<PathBuf>,
}

/// Runs the whole pipeline: read, gate, generate, render, write.
///
/// # Errors
///
/// Fails when an input cannot be read, the schema gate fails, generation
/// fails, or an output cannot be written.
pub fn run(options: &BuildOptions) -> Result<BuildOutput> {
    let started = Instant::now();

    let xml = read(&options.input)?;
    let shell = Shell::new(read(&options.shell)?);
    let weakness_shell = options.weaknesses.as_deref().map(read).transpose()?;

    let tree = SourceTree::parse(&xml)
        .with_context(|| format!("Failed to parse {}", options.input.display()))?;

    let checks = gate(&tree, &options.input, options.schema.as_deref())?;
    if !checks.all_passed() {
        for failure in checks.failures() {
            warn!(
                validator = %failure.validator,
                details = ?failure.details,
                "{}",
                failure.message
            );
        }
        bail!(
            "{} failed {} schema check(s); nothing was written",
            options.input.display(),
            checks.failure_count()
        );
    }

    let (catalog, report) = capec_codegen::generate(&tree)
        .with_context(|| format!("Failed to generate from {}", options.input.display()))?;

    let mut documents = vec![(
        options.out.join(CATALOG_ARTIFACT),
        shell.render_catalog(&catalog),
    )];
    if let Some(template) = weakness_shell {
        let ids = capec_codegen::catalog::weaknesses(tree.root())?;
        documents.push((
            options.out.join(WEAKNESS_ARTIFACT),
            weakness::to_weakness_turtle(&template, &ids),
        ));
    }

    fs::create_dir_all(&options.out)
        .with_context(|| format!("Failed to create output directory: {}", options.out.display()))?;
    let files = commit(&options.out, documents)?;

    info!(
        individuals = report.individuals(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "build complete"
    );
    Ok(BuildOutput { report, files })
}

/// Writes every document or none of them.
fn commit(dir: &Path, documents: Vec<(PathBuf, String)>) -> Result<Vec<PathBuf>> {
    let mut staged = Vec::with_capacity(documents.len());
    for (path, text) in documents {
        let mut file = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to stage {}", path.display()))?;
        file.write_all(text.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        let previous = if path.is_file() {
            Some(fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?)
        } else {
            None
        };
        staged.push((path, file, previous));
    }

    let mut written: Vec<(PathBuf, Option<Vec<u8>>)> = Vec::with_capacity(staged.len());
    for (path, file, previous) in staged {
        if let Err(e) = file.persist(&path) {
            rollback(&written);
            return Err(e.error).with_context(|| format!("Failed to write {}", path.display()));
        }
        info!(path = %path.display(), "written");
        written.push((path, previous));
    }
    Ok(written.into_iter().map(|(path, _)| path).collect())
}

fn rollback(written: &[(PathBuf, Option<Vec<u8>>)]) {
    for (path, previous) in written {
        let restored = match previous {
            Some(bytes) => fs::write(path, bytes),
            None => fs::remove_file(path),
        };
        if let Err(e) = restored {
            warn!(path = %path.display(), error = %e, "could not roll back");
        }
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"<Attack_Pattern_Catalog Name="CAPEC" Version="3.9" Date="2023-01-24">
  <Attack_Patterns>
    <Attack_Pattern ID="1" Name="Probe" Abstraction="Meta" Status="Stable">
      <Related_Weaknesses><Related_Weakness CWE_ID="200"/><Related_Weakness CWE_ID="79"/></Related_Weaknesses>
    </Attack_Pattern>
  </Attack_Patterns>
  <Categories/>
  <Views/>
</Attack_Pattern_Catalog>"#;

    fn options(dir: &Path) -> Result<BuildOptions> {
        let input = dir.join("capec.xml");
        let shell = dir.join("shell.ttl");
        let cwe_shell = dir.join("cwe_shell.ttl");
        fs::write(&input, CATALOG)?;
        fs::write(&shell, "@prefix : <urn:capec#> .\n# {{NAME}} {{VERSION}}\n")?;
        fs::write(&cwe_shell, "@prefix : <urn:cwe#> .\n")?;
        Ok(BuildOptions {
            input,
            shell,
            out: dir.join("results"),
            schema: None,
            weaknesses: Some(cwe_shell),
        })
    }

    #[test]
    fn writes_catalog_and_weaknesses() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let options = options(dir.path())?;
        let output = run(&options)?;

        assert_eq!(output.files.len(), 2);
        let catalog = fs::read_to_string(options.out.join(CATALOG_ARTIFACT))?;
        assert!(catalog.starts_with("@prefix : <urn:capec#> .\n# CAPEC 3.9\n"));
        assert!(catalog.contains("\n### CAPEC-1\n"));
        let weaknesses = fs::read_to_string(options.out.join(WEAKNESS_ARTIFACT))?;
        assert_eq!(weaknesses.matches("rdf:type :Weakness").count(), 2);
        assert_eq!(output.report.weaknesses, 2);
        Ok(())
    }

    #[test]
    fn failed_gate_writes_nothing() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let options = options(dir.path())?;
        fs::write(&options.input, CATALOG.replace(r#"Date="2023-01-24""#, r#"Date="soon""#))?;

        assert!(run(&options).is_err());
        assert!(!options.out.exists());
        Ok(())
    }

    #[test]
    fn missing_shell_is_fatal() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut options = options(dir.path())?;
        options.shell = dir.path().join("absent.ttl");

        let err = run(&options).err().map(|e| e.to_string()).unwrap_or_default();
        assert!(err.contains("absent.ttl"));
        assert!(!options.out.exists());
        Ok(())
    }

    #[test]
    fn extraction_failure_writes_nothing() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let options = options(dir.path())?;
        // Passes the gate but breaks a relationship the pattern program reads.
        fs::write(
            &options.input,
            CATALOG.replace(
                "<Related_Weaknesses>",
                r#"<Related_Attack_Patterns><Related_Attack_Pattern CAPEC_ID="1"/></Related_Attack_Patterns><Related_Weaknesses>"#,
            ),
        )?;

        assert!(run(&options).is_err());
        assert!(!options.out.exists());
        Ok(())
    }

    #[test]
    fn failed_second_write_leaves_no_partial_output() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let options = options(dir.path())?;
        fs::create_dir_all(options.out.join(WEAKNESS_ARTIFACT))?;

        assert!(run(&options).is_err());
        assert!(!options.out.join(CATALOG_ARTIFACT).exists());
        Ok(())
    }

    #[test]
    fn failed_second_write_restores_previous_output() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let options = options(dir.path())?;
        fs::create_dir_all(options.out.join(WEAKNESS_ARTIFACT))?;
        fs::write(options.out.join(CATALOG_ARTIFACT), "previous run")?;

        assert!(run(&options).is_err());
        assert_eq!(
            fs::read_to_string(options.out.join(CATALOG_ARTIFACT))?,
            "previous run"
        );
        let entries = fs::read_dir(&options.out)?.count();
        assert_eq!(entries, 2);
        Ok(())
    }
}
