/// Storyteller — interactive shell for authoring, playing and reading stories.
///
/// Usage: storyteller [--data-dir <dir>] [--seed <n>] [--no-builtins]
///
/// The data directory defaults to `$MADLIBS_DATA_DIR`, then `./madlibs-data`.
///
/// Commands (templates and stories are numbered as `list` / `stories` show them):
///   list                        list templates
///   new <title>                 create a template
///   show <t>                    show a template's sentences in bracket form
///   add <t> <text>              append a sentence, e.g. `add 1 A [adjective] day.`
///   edit <t> <s> <text>         rewrite sentence s of template t
///   drop <t> <s>                delete sentence s of template t
///   title <t> <title>           rename a template
///   delete <t>                  delete a template and its stories
///   play <t>                    fill in the blanks and save the story
///   stories [t]                 list saved stories, optionally for one template
///   read <n>                    show a saved story
///   share <n>                   print a story's share text
///   forget <n>                  delete a saved story
///   export <t> [file]           write a template bundle
///   import <file>               load a template bundle
///   help                        list commands
///   quit                        exit

use chrono::Utc;
use madlibs_engine::core::render::DisplayToken;
use madlibs_engine::core::repository::{DirectoryStore, JsonRepository};
use madlibs_engine::core::studio::{Studio, StudioBuilder};
use madlibs_engine::schema::story::StoryInstance;
use madlibs_engine::schema::template::{Template, TemplateId};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

type DiskStudio = Studio<JsonRepository<DirectoryStore>>;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut data_dir = std::env::var("MADLIBS_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("madlibs-data"));
    let mut seed = None;
    let mut builtins = true;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--data-dir" if i + 1 < args.len() => {
                i += 1;
                data_dir = PathBuf::from(&args[i]);
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().ok();
            }
            "--no-builtins" => builtins = false,
            "--help" | "-h" => {
                print_usage();
                return;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let store = match DirectoryStore::new(&data_dir) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("ERROR: cannot open data directory {}: {}", data_dir.display(), e);
            std::process::exit(1);
        }
    };
    let mut builder = StudioBuilder::new().with_builtin_templates(builtins);
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }
    let mut studio = match builder.build(JsonRepository::new(store)) {
        Ok(studio) => studio,
        Err(e) => {
            eprintln!("ERROR: cannot load stories: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "Loaded {} templates and {} saved stories from {}",
        studio.templates().len(),
        studio.stories().len(),
        data_dir.display()
    );
    println!("Type 'help' for commands.\n");

    let stdin = io::stdin();
    loop {
        let Some(line) = prompt(&stdin, "madlibs> ") else {
            break;
        };
        if line.is_empty() {
            continue;
        }

        let (cmd, rest) = line.split_once(' ').unwrap_or((line.as_str(), ""));
        let rest = rest.trim();

        match cmd.to_lowercase().as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "list" | "ls" => list_templates(&studio),
            "new" => {
                let template = studio.create_template(rest);
                match studio.save_template(template) {
                    Ok(()) => println!("Created template {}", studio.templates().len()),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "show" => {
                if let Some(template) = template_arg(&studio, rest) {
                    show_template(template);
                }
            }
            "add" => {
                let (t, text) = split_arg(rest);
                if let Some(template) = template_arg(&studio, t).cloned() {
                    let template = template.add_sentence(studio.ids());
                    let sentence_id = template.sentences[template.sentences.len() - 1].id.clone();
                    let template = template.edit_sentence_text(&sentence_id, text, studio.ids());
                    warn_invalid(&template);
                    report(studio.save_template(template));
                }
            }
            "edit" => {
                let (t, rest) = split_arg(rest);
                let (s, text) = split_arg(rest);
                if let Some(template) = template_arg(&studio, t).cloned() {
                    match sentence_index(&template, s) {
                        Some(n) => {
                            let sentence_id = template.sentences[n].id.clone();
                            let template =
                                template.edit_sentence_text(&sentence_id, text, studio.ids());
                            warn_invalid(&template);
                            report(studio.save_template(template));
                        }
                        None => println!("No sentence '{}'", s),
                    }
                }
            }
            "drop" => {
                let (t, s) = split_arg(rest);
                if let Some(template) = template_arg(&studio, t).cloned() {
                    match sentence_index(&template, s) {
                        Some(n) => {
                            let sentence_id = template.sentences[n].id.clone();
                            report(studio.save_template(template.remove_sentence(&sentence_id)));
                        }
                        None => println!("No sentence '{}'", s),
                    }
                }
            }
            "title" => {
                let (t, title) = split_arg(rest);
                if let Some(template) = template_arg(&studio, t).cloned() {
                    report(studio.save_template(template.with_title(title)));
                }
            }
            "delete" => {
                if let Some(id) = template_arg(&studio, rest).map(|t| t.id.clone()) {
                    match studio.delete_template(&id) {
                        Ok(removed) => println!("Deleted template and {} saved stories", removed),
                        Err(e) => println!("ERROR: {}", e),
                    }
                }
            }
            "play" => {
                if let Some(id) = template_arg(&studio, rest).map(|t| t.id.clone()) {
                    play(&mut studio, &id, &stdin);
                }
            }
            "stories" => list_stories(&studio, rest),
            "read" => {
                if let Some(story) = story_arg(&studio, rest) {
                    if let Some(rendered) = studio.render_story(&story.id) {
                        println!("\n{} ({})", rendered.title, rendered.template_title);
                        println!("Saved {}\n", story.saved_at.format("%Y-%m-%d %H:%M"));
                        for sentence in &rendered.sentences {
                            println!("{}", sentence_line(sentence));
                        }
                        if rendered.orphaned {
                            println!("(the template for this story has been deleted)");
                        } else if rendered.missing > 0 {
                            println!("\n{} blank(s) have no value.", rendered.missing);
                        }
                        println!();
                    }
                }
            }
            "share" => {
                if let Some(story) = story_arg(&studio, rest) {
                    match studio.share_text(&story.id) {
                        Some(text) => println!("\n{}\n", text),
                        None => println!("That story's template no longer exists."),
                    }
                }
            }
            "forget" => {
                if let Some(id) = story_arg(&studio, rest).map(|s| s.id.clone()) {
                    report(studio.delete_story(&id).map(|_| ()));
                }
            }
            "export" => {
                let (t, file) = split_arg(rest);
                if let Some(id) = template_arg(&studio, t).map(|t| t.id.clone()) {
                    if let Some(bundle) = studio.export_bundle(&id, Utc::now()) {
                        let path = if file.is_empty() {
                            PathBuf::from(bundle.suggested_file_name())
                        } else {
                            PathBuf::from(file)
                        };
                        let written = bundle
                            .to_json()
                            .map_err(|e| e.to_string())
                            .and_then(|json| std::fs::write(&path, json).map_err(|e| e.to_string()));
                        match written {
                            Ok(()) => println!("Exported to {}", path.display()),
                            Err(e) => println!("ERROR: {}", e),
                        }
                    }
                }
            }
            "import" => match std::fs::read_to_string(rest) {
                Ok(json) => match studio.import_bundle(&json) {
                    Ok(id) => {
                        let count = studio.stories_for(&id).count();
                        println!("Imported template with {} saved stories", count);
                    }
                    Err(e) => println!("ERROR: {}", e),
                },
                Err(e) => println!("ERROR: cannot read {}: {}", rest, e),
            },
            _ => println!("Unknown command '{}'. Type 'help' for commands.", cmd),
        }
    }
}

fn prompt(stdin: &io::Stdin, label: &str) -> Option<String> {
    print!("{}", label);
    io::stdout().flush().ok();
    let mut line = String::new();
    match stdin.lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

fn split_arg(s: &str) -> (&str, &str) {
    match s.split_once(' ') {
        Some((first, rest)) => (first, rest.trim()),
        None => (s, ""),
    }
}

fn template_arg<'a>(studio: &'a DiskStudio, arg: &str) -> Option<&'a Template> {
    let found = arg
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|n| studio.templates().get(n));
    if found.is_none() {
        println!("No template '{}'. Use 'list' to see template numbers.", arg);
    }
    found
}

fn story_arg<'a>(studio: &'a DiskStudio, arg: &str) -> Option<&'a StoryInstance> {
    let found = arg
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|n| studio.stories().get(n));
    if found.is_none() {
        println!("No story '{}'. Use 'stories' to see story numbers.", arg);
    }
    found
}

fn sentence_index(template: &Template, arg: &str) -> Option<usize> {
    arg.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .filter(|n| *n < template.sentences.len())
}

fn report<E: std::fmt::Display>(result: Result<(), E>) {
    if let Err(e) = result {
        println!("ERROR: {}", e);
    }
}

fn warn_invalid(template: &Template) {
    if !template.validate().is_empty() {
        println!("Note: a blank has no part of speech; write it like [noun].");
    }
}

fn list_templates(studio: &DiskStudio) {
    if studio.templates().is_empty() {
        println!("No templates yet. Create one with 'new <title>'.");
        return;
    }
    for (i, template) in studio.templates().iter().enumerate() {
        println!(
            "{:>3}. {}  ({} sentences, {} blanks, {} saved)",
            i + 1,
            if template.title.is_empty() { "<untitled>" } else { template.title.as_str() },
            template.sentences.len(),
            template.blanks().count(),
            studio.stories_for(&template.id).count()
        );
    }
}

fn show_template(template: &Template) {
    println!("\n{}", template.title);
    if template.sentences.is_empty() {
        println!("  (no sentences yet; add one with 'add')");
    }
    for (i, sentence) in template.sentences.iter().enumerate() {
        println!("  {}. {}", i + 1, sentence.to_text());
    }
    println!();
}

fn list_stories(studio: &DiskStudio, filter: &str) {
    let template_id = if filter.is_empty() {
        None
    } else {
        match template_arg(studio, filter) {
            Some(t) => Some(t.id.clone()),
            None => return,
        }
    };
    let mut shown = 0;
    for (i, story) in studio.stories().iter().enumerate() {
        if template_id.as_ref().is_some_and(|id| id != &story.template_id) {
            continue;
        }
        let template_title = studio
            .template(&story.template_id)
            .map(|t| t.title.as_str());
        println!(
            "{:>3}. {}  [{}]  {}",
            i + 1,
            story.display_title(template_title.unwrap_or("Unknown Story")),
            template_title.unwrap_or("Unknown Template"),
            story.saved_at.format("%Y-%m-%d %H:%M")
        );
        shown += 1;
    }
    if shown == 0 {
        println!("No saved stories. Play a template and save it to see it here.");
    }
}

fn sentence_line(tokens: &[DisplayToken]) -> String {
    tokens
        .iter()
        .map(|token| match token {
            DisplayToken::Filled { value, .. } => value.to_uppercase(),
            other => other.as_str().to_string(),
        })
        .collect()
}

fn play(studio: &mut DiskStudio, id: &TemplateId, stdin: &io::Stdin) {
    let Some(mut session) = studio.start_play(id) else {
        return;
    };
    if session.prompts().next().is_none() {
        println!("This template has no blanks yet.");
        return;
    }
    println!("\nPlaying '{}'. Enter a word for each blank.\n", session.template().title);

    let prompts: Vec<_> = session
        .prompts()
        .map(|(n, item)| (n, item.id.clone(), item.blank.label()))
        .collect();
    for (n, item_id, label) in prompts {
        loop {
            let Some(word) = prompt(stdin, &format!("{:>2}. {}: ", n, label)) else {
                return;
            };
            if word.is_empty() {
                println!("    (a word is needed)");
                continue;
            }
            session.set_value(&item_id, word);
            break;
        }
    }

    println!();
    for sentence in &session.preview() {
        println!("{}", sentence_line(sentence));
    }
    println!();

    let Some(answer) = prompt(stdin, "Save this story? Title (blank for default, '-' to discard): ")
    else {
        return;
    };
    if answer == "-" {
        println!("Discarded.");
        return;
    }
    let title = (!answer.is_empty()).then_some(answer);
    match studio.save_story(&session, title, false) {
        Ok(story) => println!("Saved story {}", story.id),
        Err(e) => println!("ERROR: {}", e),
    }
}

fn print_usage() {
    println!("Usage: storyteller [--data-dir <dir>] [--seed <n>] [--no-builtins]");
}

fn print_help() {
    println!("Commands:");
    println!("  list                 list templates");
    println!("  new <title>          create a template");
    println!("  show <t>             show a template's sentences");
    println!("  add <t> <text>       append a sentence; blanks look like [noun] or [verb:past tense]");
    println!("  edit <t> <s> <text>  rewrite a sentence");
    println!("  drop <t> <s>         delete a sentence");
    println!("  title <t> <title>    rename a template");
    println!("  delete <t>           delete a template and its saved stories");
    println!("  play <t>             fill in the blanks");
    println!("  stories [t]          list saved stories");
    println!("  read <n>             show a saved story");
    println!("  share <n>            print a story's share text");
    println!("  forget <n>           delete a saved story");
    println!("  export <t> [file]    write a template bundle");
    println!("  import <file>        load a template bundle");
    println!("  quit                 exit");
    println!("Use [[ and ]] for literal brackets.");
}
