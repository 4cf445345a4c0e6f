// [libs/infra/decompiler-client/src/lib.rs]
/*!
 * APARATO: DECOMPILER COLLABORATOR CLIENT
 * CLASIFICACION: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: INVOCACION DEL COLABORADOR DE DECOMPILACION (STAGE A)
 *
 * El colaborador se invoca como subproceso con una ruta de archivo y un
 * dial de profundidad; su costo de arranque (proceso por invocacion o
 * pool) se tolera aqui. Crasheos y timeouts se propagan como errores para
 * que C8 decida retry vs dead-letter.
 */

pub mod errors;

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use bin2nlp_domain_models::{DecompilationDocument, ExtractedString, FileMetadata, ImportedSymbol, DecompiledFunction};
use serde::Deserialize;
use tokio::process::Command;
use tracing::{instrument, warn};
use uuid::Uuid;

pub use errors::DecompilerError;

/// Wire shape emitted by the external collaborator on stdout. It carries no
/// decompilation id of its own — one is minted here on receipt.
#[derive(Debug, Deserialize)]
struct CollaboratorOutput {
    functions: Vec<DecompiledFunction>,
    #[serde(default)]
    imports: Vec<ImportedSymbol>,
    #[serde(default)]
    strings: Vec<ExtractedString>,
    file_metadata: FileMetadata,
}

/// Contract any decompilation collaborator must satisfy. Kept behind a
/// trait so the pipeline executor never depends on the subprocess
/// transport directly.
#[async_trait]
pub trait DecompilationCollaborator: Send + Sync {
    async fn analyze(
        &self,
        input_path: &Path,
        depth_dial: &str,
        deadline: Duration,
    ) -> Result<DecompilationDocument, DecompilerError>;
}

/// Invokes a configured external binary per analysis request. No specific
/// decompiler tool is mandated; any binary accepting
/// `<executable> <input-path> --depth <dial>` and emitting the collaborator
/// output shape on stdout is compatible.
pub struct SubprocessDecompiler {
    executable_path: PathBuf,
}

impl SubprocessDecompiler {
    pub fn new(executable_path: impl Into<PathBuf>) -> Self {
        Self {
            executable_path: executable_path.into(),
        }
    }
}

#[async_trait]
impl DecompilationCollaborator for SubprocessDecompiler {
    #[instrument(skip(self))]
    async fn analyze(
        &self,
        input_path: &Path,
        depth_dial: &str,
        deadline: Duration,
    ) -> Result<DecompilationDocument, DecompilerError> {
        let spawn = Command::new(&self.executable_path)
            .arg(input_path)
            .arg("--depth")
            .arg(depth_dial)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        let output = match tokio::time::timeout(deadline, spawn).await {
            Ok(Ok(output)) => output,
            Ok(Err(io_error)) => return Err(DecompilerError::SpawnFailed(io_error)),
            Err(_elapsed) => {
                warn!("⏱️  [decompiler_client]: collaborator exceeded deadline of {:?}", deadline);
                return Err(DecompilerError::Timeout);
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(DecompilerError::NonZeroExit(output.status.code().unwrap_or(-1), stderr));
        }

        let parsed: CollaboratorOutput = serde_json::from_slice(&output.stdout)?;

        Ok(DecompilationDocument {
            decompilation_id: Uuid::new_v4(),
            functions: parsed.functions,
            imports: parsed.imports,
            strings: parsed.strings,
            file_metadata: parsed.file_metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fake_collaborator_script(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let script_path = dir.path().join("fake_decompiler.sh");
        let mut file = std::fs::File::create(&script_path).expect("create script");
        writeln!(file, "#!/bin/sh\n{body}").expect("write script");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&script_path).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&script_path, perms).unwrap();
        }
        script_path
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn analyze_parses_collaborator_json_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = fake_collaborator_script(
            &dir,
            r#"echo '{"functions":[{"name":"main","entry_address":"0x1000","size_bytes":64,"disassembly":"nop","pseudocode":null,"call_targets":[]}],"imports":[],"strings":[],"file_metadata":{"format":"elf","architecture":"x86_64","size_bytes":2048,"entry_point":"0x1000"}}'"#,
        );
        let collaborator = SubprocessDecompiler::new(script);
        let input = dir.path().join("sample.bin");
        std::fs::write(&input, b"\x7fELF").expect("write sample");

        let document = collaborator
            .analyze(&input, "default", Duration::from_secs(5))
            .await
            .expect("analyze");

        assert_eq!(document.function_count(), 1);
        assert_eq!(document.file_metadata.architecture, "x86_64");
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn analyze_surfaces_nonzero_exit_as_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = fake_collaborator_script(&dir, "echo 'boom' >&2\nexit 1");
        let collaborator = SubprocessDecompiler::new(script);
        let input = dir.path().join("sample.bin");
        std::fs::write(&input, b"\x7fELF").expect("write sample");

        let result = collaborator.analyze(&input, "default", Duration::from_secs(5)).await;
        assert!(matches!(result, Err(DecompilerError::NonZeroExit(_, _))));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn analyze_times_out_on_a_hanging_collaborator() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = fake_collaborator_script(&dir, "sleep 5");
        let collaborator = SubprocessDecompiler::new(script);
        let input = dir.path().join("sample.bin");
        std::fs::write(&input, b"\x7fELF").expect("write sample");

        let result = collaborator
            .analyze(&input, "default", Duration::from_millis(50))
            .await;
        assert!(matches!(result, Err(DecompilerError::Timeout)));
    }
}
