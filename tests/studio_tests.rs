/// Studio integration tests — author, play, save, edit, share and move templates.

use chrono::Utc;
use madlibs_engine::core::ids::SequentialIds;
use madlibs_engine::core::render::{MISSING_MARKER, UNKNOWN_TEMPLATE};
use madlibs_engine::core::repository::{
    DirectoryStore, JsonRepository, KeyValueStore, MemoryStore, Repository, STORIES_KEY,
};
use madlibs_engine::core::studio::{Studio, StudioBuilder, StudioError};
use madlibs_engine::core::play::PlayError;
use madlibs_engine::schema::story::BlankValues;
use madlibs_engine::schema::template::{Template, TemplateId};

type MemoryStudio = Studio<JsonRepository<MemoryStore>>;

fn empty_studio() -> MemoryStudio {
    StudioBuilder::new()
        .with_builtin_templates(false)
        .with_id_source(Box::new(SequentialIds::default()))
        .build(JsonRepository::new(MemoryStore::new()))
        .unwrap()
}

/// Author a one-sentence template through the studio and save it.
fn authored<R: Repository>(studio: &mut Studio<R>, title: &str, text: &str) -> Template {
    let template = studio.create_template(title);
    let template = template.add_sentence(studio.ids());
    let sentence_id = template.sentences[0].id.clone();
    let template = template.edit_sentence_text(&sentence_id, text, studio.ids());
    studio.save_template(template.clone()).unwrap();
    template
}

#[test]
fn author_play_and_read_a_story() {
    let mut studio = empty_studio();
    let template = authored(
        &mut studio,
        "Escape",
        "The [animal:big cat] jumped over the [noun].",
    );

    let mut session = studio.start_play(&template.id).unwrap();
    let blanks: Vec<_> = session.prompts().map(|(_, b)| b.id.clone()).collect();
    session.set_value(&blanks[0], "lion");
    assert!(matches!(
        studio.save_story(&session, None, false),
        Err(StudioError::Play(PlayError::Incomplete { missing: 1 }))
    ));
    session.set_value(&blanks[1], "fence");

    let story = studio.save_story(&session, None, false).unwrap();
    let rendered = studio.render_story(&story.id).unwrap();
    assert_eq!(rendered.text(), "The lion jumped over the fence.");
    assert_eq!(rendered.missing, 0);
    assert_eq!(
        studio.share_text(&story.id).unwrap(),
        "\"Escape\"\n\nThe lion jumped over the fence."
    );
}

#[test]
fn editing_the_template_after_saving_leaves_gaps() {
    let mut studio = empty_studio();
    let template = authored(&mut studio, "Escape", "The [animal] met a [noun].");
    let mut session = studio.start_play(&template.id).unwrap();
    let blanks: Vec<_> = session.prompts().map(|(_, b)| b.id.clone()).collect();
    for (id, word) in blanks.iter().zip(["tiger", "teapot"]) {
        session.set_value(id, word);
    }
    let story = studio.save_story(&session, None, false).unwrap();

    // change the second blank; its old value no longer applies
    let sentence_id = template.sentences[0].id.clone();
    let edited = template.edit_sentence_text(&sentence_id, "The [animal] met a [verb].", studio.ids());
    studio.save_template(edited).unwrap();

    let rendered = studio.render_story(&story.id).unwrap();
    assert_eq!(rendered.missing, 1);
    assert_eq!(rendered.text(), format!("The tiger met a {}.", MISSING_MARKER));
}

#[test]
fn forced_save_and_later_edit() {
    let mut studio = empty_studio();
    let template = authored(&mut studio, "Lunch", "I ate [number] [food:plural].");
    let session = studio.start_play(&template.id).unwrap();
    let story = studio.save_story(&session, Some("Hungry".into()), true).unwrap();
    assert_eq!(studio.render_story(&story.id).unwrap().missing, 2);

    let values: BlankValues = template
        .blanks()
        .zip(["nine", "pancakes"])
        .map(|(b, v)| (b.id.clone(), v.to_string()))
        .collect();
    let edited = story.with_edits(values, "Lunch", &template.title);
    assert!(studio.update_story(edited).unwrap());

    let rendered = studio.render_story(&story.id).unwrap();
    assert_eq!(rendered.text(), "I ate nine pancakes.");
    assert_eq!(rendered.title, "Hungry");
}

#[test]
fn deleting_a_template_cascades_to_stories() {
    let mut studio = empty_studio();
    let keep = authored(&mut studio, "Keep", "A [noun].");
    let doomed = authored(&mut studio, "Doomed", "B [noun].");
    for template in [&keep, &doomed, &doomed] {
        let session = studio.start_play(&template.id).unwrap();
        studio.save_story(&session, None, true).unwrap();
    }
    assert_eq!(studio.templates_with_stories().len(), 2);

    assert_eq!(studio.delete_template(&doomed.id).unwrap(), 2);
    assert_eq!(studio.stories().len(), 1);
    assert_eq!(studio.stories_for(&keep.id).count(), 1);
    assert_eq!(studio.repository().load_stories().unwrap().len(), 1);
    assert!(studio.template(&doomed.id).is_none());
}

#[test]
fn orphaned_stories_render_degraded() {
    // a story whose template was removed outside the studio
    let mut repo = JsonRepository::new(MemoryStore::new());
    repo.save_stories(&[madlibs_engine::schema::story::StoryInstance {
        id: "lost".into(),
        template_id: "gone".into(),
        saved_at: Utc::now(),
        blank_values: BlankValues::default(),
        custom_title: None,
        author_name: None,
    }])
    .unwrap();
    let studio = StudioBuilder::new()
        .with_builtin_templates(false)
        .seed(9)
        .build(repo)
        .unwrap();

    let rendered = studio.render_story(&"lost".into()).unwrap();
    assert!(rendered.orphaned);
    assert_eq!(rendered.template_title, UNKNOWN_TEMPLATE);
    assert!(studio.share_text(&"lost".into()).is_none());
}

#[test]
fn export_then_import_creates_a_copy() {
    let mut studio = empty_studio();
    let template = authored(&mut studio, "Camping", "We saw a [animal].");
    let mut session = studio.start_play(&template.id).unwrap();
    let blank = session.prompts().next().unwrap().1.id.clone();
    session.set_value(&blank, "moose");
    let original_story = studio.save_story(&session, None, false).unwrap();

    let bundle = studio.export_bundle(&template.id, Utc::now()).unwrap();
    let json = bundle.to_json().unwrap();
    let new_id = studio.import_bundle(&json).unwrap();

    assert_ne!(new_id, template.id);
    let copy = studio.template(&new_id).unwrap();
    assert_eq!(copy.title, "Camping (Imported)");
    let copies: Vec<_> = studio.stories_for(&new_id).collect();
    assert_eq!(copies.len(), 1);
    assert_ne!(copies[0].id, original_story.id);
    assert_eq!(
        studio.render_story(&copies[0].id).unwrap().text(),
        "We saw a moose."
    );
    assert_eq!(studio.templates().len(), 2);
}

#[test]
fn malformed_import_writes_nothing() {
    let mut studio = empty_studio();
    authored(&mut studio, "Only", "One [noun].");
    let before = studio.repository().store().get(STORIES_KEY).unwrap();

    let result = studio.import_bundle(r#"{"template": {"id": "x", "title": "t"}}"#);
    assert!(matches!(result, Err(StudioError::Bundle(_))));
    assert_eq!(studio.templates().len(), 1);
    assert_eq!(studio.repository().store().get(STORIES_KEY).unwrap(), before);
}

#[test]
fn directory_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let template_id: TemplateId;
    {
        let store = DirectoryStore::new(dir.path()).unwrap();
        let mut studio = StudioBuilder::new().seed(1).build(JsonRepository::new(store)).unwrap();
        let template = studio.create_template("Persistent");
        template_id = template.id.clone();
        studio.save_template(template).unwrap();
    }

    let store = DirectoryStore::new(dir.path()).unwrap();
    let studio = StudioBuilder::new().seed(2).build(JsonRepository::new(store)).unwrap();
    assert!(studio.template(&template_id).is_some());
    // built-ins were written on first open and are not duplicated
    let builtin_count = madlibs_engine::builtin_templates::builtin_templates().len();
    assert_eq!(studio.templates().len(), builtin_count + 1);
}

#[test]
fn reopening_with_the_same_seed_keeps_item_ids_unique() {
    let dir = tempfile::tempdir().unwrap();
    let template_id: TemplateId;
    {
        let store = DirectoryStore::new(dir.path()).unwrap();
        let mut studio = StudioBuilder::new()
            .with_builtin_templates(false)
            .seed(1)
            .build(JsonRepository::new(store))
            .unwrap();
        template_id = authored(&mut studio, "Replay", "[a][b]").id;
    }

    let store = DirectoryStore::new(dir.path()).unwrap();
    let mut studio = StudioBuilder::new()
        .with_builtin_templates(false)
        .seed(1)
        .build(JsonRepository::new(store))
        .unwrap();
    let template = studio.template(&template_id).cloned().unwrap();
    let sentence_id = template.sentences[0].id.clone();
    let edited = template.edit_sentence_text(&sentence_id, "t[a]u[q][r][s]", studio.ids());

    let ids: Vec<_> = edited.sentences[0].content.iter().map(|c| c.id().clone()).collect();
    let unique: std::collections::HashSet<_> = ids.iter().collect();
    assert_eq!(ids.len(), 6);
    assert_eq!(unique.len(), ids.len());
    // [a] kept its identity
    assert_eq!(ids[1], template.sentences[0].content[0].id().clone());
}

#[test]
fn legacy_story_records_resolve() {
    let mut store = MemoryStore::new();
    store
        .set(
            "madlibs-stories",
            r#"[{"id":"1753122693148","title":"Old","content":[{"id":"b","type":"blank","blank":{"partOfSpeech":"noun"}}]}]"#
                .to_string(),
        )
        .unwrap();
    store
        .set(
            STORIES_KEY,
            r#"[{"id":"s","storyId":"1753122693148","savedAt":"2025-07-21T18:30:00.000Z","blankValues":{"b":"hat"}}]"#
                .to_string(),
        )
        .unwrap();
    let studio = StudioBuilder::new()
        .with_builtin_templates(false)
        .seed(4)
        .build(JsonRepository::new(store))
        .unwrap();
    assert_eq!(studio.render_story(&"s".into()).unwrap().text(), "hat");
}
