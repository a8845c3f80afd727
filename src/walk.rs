use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use zip::ZipArchive;

/// One compiled-class payload with a human-readable origin for diagnostics.
pub(crate) struct ClassInput {
    pub(crate) source: String,
    pub(crate) data: Vec<u8>,
}

/// Enumerate the class files reachable from `input`: a single `.class`
/// file, a directory tree, or a `.jar` archive.
pub(crate) fn collect_inputs(input: &Path) -> Result<Vec<ClassInput>> {
    let mut inputs = Vec::new();

    if input.is_dir() {
        collect_dir(input, &mut inputs)?;
        return Ok(inputs);
    }

    let extension = input.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    match extension {
        "class" => {
            let data =
                fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
            inputs.push(ClassInput {
                source: input.to_string_lossy().to_string(),
                data,
            });
        }
        "jar" => collect_jar(input, &mut inputs)?,
        _ => anyhow::bail!("unsupported input file: {}", input.display()),
    }

    Ok(inputs)
}

fn collect_dir(path: &Path, inputs: &mut Vec<ClassInput>) -> Result<()> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(path)
        .with_context(|| format!("failed to read directory {}", path.display()))?
    {
        let entry =
            entry.with_context(|| format!("failed to read entry under {}", path.display()))?;
        entries.push(entry.path());
    }

    // Keep deterministic ordering by sorting directory listings.
    entries.sort_by(|a, b| path_key(a).cmp(&path_key(b)));

    for entry in entries {
        if entry.is_dir() {
            collect_dir(&entry, inputs)?;
            continue;
        }
        let name = entry.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name.ends_with(".class") && name != "module-info.class" {
            let data =
                fs::read(&entry).with_context(|| format!("failed to read {}", entry.display()))?;
            inputs.push(ClassInput {
                source: entry.to_string_lossy().to_string(),
                data,
            });
        }
    }

    Ok(())
}

fn collect_jar(path: &Path, inputs: &mut Vec<ClassInput>) -> Result<()> {
    let file = fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut archive =
        ZipArchive::new(file).with_context(|| format!("failed to read {}", path.display()))?;

    let mut entry_names = Vec::new();
    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        if name.ends_with(".class") && !name.ends_with("module-info.class") {
            entry_names.push(name);
        }
    }

    entry_names.sort();

    for name in entry_names {
        let mut entry = archive
            .by_name(&name)
            .with_context(|| format!("failed to read {}:{}", path.display(), name))?;
        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .with_context(|| format!("failed to read {}:{}", path.display(), name))?;
        inputs.push(ClassInput {
            source: jar_entry_uri(path, &name),
            data,
        });
    }

    Ok(())
}

fn jar_entry_uri(jar_path: &Path, entry_name: &str) -> String {
    format!("jar:{}!/{}", jar_path.to_string_lossy(), entry_name)
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
