/// Template Linter — checks templates (and optionally saved stories) for problems.
///
/// Usage: template_linter <template.ron | template_dir> [--data-dir <dir>]
///
/// RON template files are checked on their own; with `--data-dir`, the stored
/// templates and saved stories in that directory are checked as well.

use madlibs_engine::builtin_templates::load_from_ron;
use madlibs_engine::core::render::find_missing_blanks;
use madlibs_engine::core::repository::{
    DirectoryStore, JsonRepository, Repository, RepositoryError,
};
use madlibs_engine::schema::story::StoryInstance;
use madlibs_engine::schema::template::Template;
use std::collections::HashSet;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: template_linter <template.ron | template_dir> [--data-dir <dir>]");
        process::exit(0);
    }

    let template_path = &args[1];
    let mut data_dir = None;

    let mut i = 2;
    while i < args.len() {
        if args[i] == "--data-dir" && i + 1 < args.len() {
            i += 1;
            data_dir = Some(args[i].clone());
        }
        i += 1;
    }

    let mut templates = Vec::new();
    let path = Path::new(template_path);

    if path.is_file() {
        match load_from_ron(path) {
            Ok(t) => templates.push(t),
            Err(e) => {
                eprintln!("ERROR: Failed to load template file: {}", e);
                process::exit(1);
            }
        }
    } else if path.is_dir() {
        load_templates_recursive(path, &mut templates);
    } else {
        eprintln!("ERROR: Path '{}' does not exist", template_path);
        process::exit(1);
    }

    let mut stories = Vec::new();
    if let Some(ref dir) = data_dir {
        match load_data_dir(dir) {
            Ok((stored_templates, stored_stories)) => {
                templates.extend(stored_templates);
                stories = stored_stories;
            }
            Err(e) => {
                eprintln!("ERROR: Failed to read data directory '{}': {}", dir, e);
                process::exit(1);
            }
        }
    }

    println!("Loaded {} templates, {} saved stories", templates.len(), stories.len());

    let (errors, warnings) = lint(&templates, &stories);

    println!("\n=== Template Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn load_templates_recursive(dir: &Path, templates: &mut Vec<Template>) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                load_templates_recursive(&path, templates);
            } else if path.extension().and_then(|s| s.to_str()) == Some("ron") {
                match load_from_ron(&path) {
                    Ok(t) => {
                        println!("  Loaded: {}", path.display());
                        templates.push(t);
                    }
                    Err(e) => {
                        eprintln!("  ERROR loading {}: {}", path.display(), e);
                    }
                }
            }
        }
    }
}

fn load_data_dir(dir: &str) -> Result<(Vec<Template>, Vec<StoryInstance>), RepositoryError> {
    let repo = JsonRepository::new(DirectoryStore::new(dir)?);
    Ok((repo.load_templates()?, repo.load_stories()?))
}

fn lint(templates: &[Template], stories: &[StoryInstance]) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let mut seen = HashSet::new();
    for template in templates {
        if !seen.insert(template.id.as_str()) {
            errors.push(format!("Duplicate template id '{}'", template.id));
        }

        let name = if template.title.trim().is_empty() {
            format!("<untitled {}>", template.id)
        } else {
            format!("'{}'", template.title)
        };

        if template.title.trim().is_empty() {
            warnings.push(format!("Template {} has no title", template.id));
        }
        if template.sentences.is_empty() {
            warnings.push(format!("Template {} has no sentences", name));
        }
        if template.blanks().next().is_none() && !template.sentences.is_empty() {
            warnings.push(format!("Template {} has no blanks to fill", name));
        }

        for (n, sentence) in template.sentences.iter().enumerate() {
            if sentence.content.is_empty() {
                warnings.push(format!("Template {} sentence {} is empty", name, n + 1));
            }
        }

        for problem in template.validate() {
            errors.push(format!("Template {}: {}", name, problem));
        }
    }

    for story in stories {
        match templates.iter().find(|t| t.id == story.template_id) {
            None => warnings.push(format!(
                "Story '{}' references missing template '{}'",
                story.id, story.template_id
            )),
            Some(template) => {
                let missing = find_missing_blanks(template, &story.blank_values);
                if !missing.is_empty() {
                    warnings.push(format!(
                        "Story '{}' is missing {} value(s): {}",
                        story.id,
                        missing.len(),
                        missing
                            .iter()
                            .map(|b| b.blank.label())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ));
                }
            }
        }
    }

    (errors, warnings)
}
