use std::fmt::Write;

use crate::content::{Example, LessonContent};

/// Renders a lesson as Markdown for printing or export. Sections the provider did
/// not send are left out entirely.
pub fn markdown(content: &LessonContent) -> String {
    let mut out = String::new();

    let title = content
        .title
        .as_deref()
        .or(content.topic.as_deref())
        .unwrap_or("Lesson plan");
    let _ = writeln!(out, "# {}\n", title);

    let meta: Vec<String> = [
        content.level.as_ref().map(|l| format!("**Level:** {}", l)),
        content.topic.as_ref().map(|t| format!("**Topic:** {}", t)),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !meta.is_empty() {
        let _ = writeln!(out, "{}\n", meta.join(" | "));
    }

    if !content.learning_objectives.is_empty() {
        out.push_str("## Learning objectives\n\n");
        for objective in &content.learning_objectives {
            let _ = writeln!(out, "- {}", objective);
        }
        out.push('\n');
    }

    out.push_str("## Sentence frame\n\n");
    let _ = writeln!(out, "> {}\n", content.pattern_template);
    if let Some(focus) = &content.grammar_focus {
        let _ = writeln!(out, "_Grammar focus:_ {}\n", focus);
    }
    for (part, explanation) in content.pattern_breakdown.parts() {
        let _ = writeln!(out, "- **{}**: {}", part, explanation);
    }
    if !content.pattern_breakdown.is_empty() {
        out.push('\n');
    }

    out.push_str("## Examples\n\n");
    for (index, example) in content.examples.iter().enumerate() {
        out.push_str(&example_markdown(index + 1, example));
    }
    out.push('\n');

    if !content.vocabulary.is_empty() {
        out.push_str("## Vocabulary\n\n");
        for item in &content.vocabulary {
            let _ = write!(out, "- **{}**: {}", item.word, item.definition);
            if let Some(example) = &item.example {
                let _ = write!(out, " _({})_", example);
            }
            out.push('\n');
        }
        out.push('\n');
    }

    if !content.common_mistakes.is_empty() {
        out.push_str("## Common mistakes\n\n");
        for mistake in &content.common_mistakes {
            let _ = write!(out, "- ~~{}~~ → {}", mistake.incorrect, mistake.correct);
            if let Some(explanation) = &mistake.explanation {
                let _ = write!(out, ": {}", explanation);
            }
            out.push('\n');
        }
        out.push('\n');
    }

    if !content.practice_activities.is_empty() {
        out.push_str("## Practice\n\n");
        for activity in &content.practice_activities {
            let _ = writeln!(out, "### {}\n", activity.title);
            if !activity.instructions.is_empty() {
                let _ = writeln!(out, "{}\n", activity.instructions);
            }
            for (index, item) in activity.items.iter().enumerate() {
                let _ = writeln!(out, "{}. {}", index + 1, item);
            }
            if !activity.items.is_empty() {
                out.push('\n');
            }
        }
    }

    let pictured: Vec<_> = content
        .illustrations
        .iter()
        .filter(|i| i.image.is_some())
        .collect();
    if !pictured.is_empty() {
        out.push_str("## Illustrations\n\n");
        for illustration in pictured {
            let alt = illustration.caption.as_deref().unwrap_or(&illustration.prompt);
            if let Some(image) = &illustration.image {
                let _ = writeln!(out, "![{}]({})\n", alt, image);
            }
        }
    }

    if let Some(notes) = &content.teacher_notes {
        let _ = writeln!(out, "## Teacher notes\n\n{}", notes);
    }

    out.trim_end().to_string() + "\n"
}

/// One numbered example line, followed by its breakdown when it has one.
pub fn example_markdown(number: usize, example: &Example) -> String {
    let mut out = format!("{}. {}\n", number, example.sentence());
    for (part, explanation) in example.breakdown() {
        let _ = writeln!(out, "   - **{}**: {}", part, explanation);
    }
    if let Some(note) = example.note() {
        let _ = writeln!(out, "   - _{}_", note);
    }
    out
}
