use agenda_core::{render, render_plain_text, AgendaDocument, RenderMode, Subtopic, Topic};

fn document() -> AgendaDocument {
    let mut document = AgendaDocument::empty("Board Meeting", "2024-09-10");
    let mut budget = Topic::new("Budget");
    budget.completed = true;
    budget.comment = "Approved\n\nRevisit in Q4".to_string();
    budget.subtopics.push(Subtopic::new("Marketing"));
    document.topics.push(budget);
    document.topics.push(Topic::new(""));
    document
}

#[test]
fn edit_mode_exposes_controls_and_bindings() {
    let document = document();

    let view = render(&document, RenderMode::Edit, 7);

    assert_eq!(view.generation, 7);
    assert_eq!(view.header.title.value, "Board Meeting");
    assert!(view.add_topic_clicked().is_some());
    let card = &view.topics[0];
    assert_eq!(card.binding.index, 0);
    assert_eq!(card.binding.id, document.topics[0].id);
    assert_eq!(card.class_name(), "topic-card topic-completed");
    assert!(card.toggle.enabled);
    assert!(card.comment.multiline);
    assert_eq!(card.comment.placeholder, "Add notes or minutes here...");
    assert_eq!(card.add_subtopic.as_ref().unwrap().label, "+ Add Sub-item");
    assert_eq!(
        card.delete.as_ref().unwrap().confirm,
        Some("Delete this topic?")
    );
    let row = &card.subtopics[0];
    assert_eq!(row.binding.topic(), card.binding);
    assert_eq!(row.title.placeholder, "Sub-item");
    assert!(row.delete_clicked().is_some());
}

#[test]
fn print_mode_hides_controls_and_locks_fields() {
    let view = render(&document(), RenderMode::Print, 1);

    assert!(view.add_topic_clicked().is_none());
    assert!(view.header.title.read_only);
    for card in &view.topics {
        assert!(card.add_subtopic_clicked().is_none());
        assert!(card.delete_clicked().is_none());
        assert!(!card.toggle.enabled);
        assert!(card.title.read_only);
        for row in &card.subtopics {
            assert!(row.delete_clicked().is_none());
            assert!(!row.toggle.enabled);
        }
    }
}

#[test]
fn plain_text_layout_numbers_topics() {
    let view = render(&document(), RenderMode::Print, 1);

    let text = render_plain_text(&view);

    let expected = "Board Meeting\n\
                    Date: 2024-09-10\n\
                    \n\
                    [x] 1. Budget\n      \
                    Approved\n\
                    \n      \
                    Revisit in Q4\n      \
                    [ ] Marketing\n\
                    \n\
                    [ ] 2. (untitled)\n";
    assert_eq!(text, expected);
}

#[test]
fn plain_text_skips_blank_comment() {
    let mut document = AgendaDocument::empty("Standup", "2024-09-11");
    let mut topic = Topic::new("Blockers");
    topic.comment = "  \n ".to_string();
    document.topics.push(topic);

    let text = render_plain_text(&render(&document, RenderMode::Print, 1));

    assert_eq!(text, "Standup\nDate: 2024-09-11\n\n[ ] 1. Blockers\n");
}
