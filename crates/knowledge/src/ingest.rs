//! Document and QA pair ingestion: validate, normalize, persist.

use crate::store::MethodicStore;
use crate::types::{Document, NewDocument, NewQaPair, QaPair};
use methodics_core::{AppError, AppResult};
use serde::Serialize;
use std::path::Path;

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_body(body: &str) -> String {
    body.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

/// Trim fields and reject blank titles or bodies.
pub fn normalize_document(input: NewDocument) -> AppResult<NewDocument> {
    let title = input.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::Validation("title must not be empty".to_string()));
    }

    let body = normalize_body(&input.body);
    if body.is_empty() {
        return Err(AppError::Validation("body must not be empty".to_string()));
    }

    Ok(NewDocument {
        title,
        subject: clean_optional(input.subject),
        author: clean_optional(input.author),
        body,
    })
}

/// Trim fields and reject blank questions or answers.
pub fn normalize_qa_pair(input: NewQaPair) -> AppResult<NewQaPair> {
    let question = input.question.trim().to_string();
    let answer = input.answer.trim().to_string();

    if question.is_empty() {
        return Err(AppError::Validation("question must not be empty".to_string()));
    }
    if answer.is_empty() {
        return Err(AppError::Validation("answer must not be empty".to_string()));
    }

    Ok(NewQaPair {
        question,
        answer,
        document_id: input.document_id,
    })
}

/// Validate, normalize and store a document.
pub fn ingest_document(store: &dyn MethodicStore, input: NewDocument) -> AppResult<Document> {
    let document = normalize_document(input)?;
    let stored = store.create_document(&document)?;
    tracing::info!("Ingested methodic {}: {}", stored.id, stored.title);
    Ok(stored)
}

/// Validate and store a QA pair; the linked document must exist.
pub fn ingest_qa_pair(store: &dyn MethodicStore, input: NewQaPair) -> AppResult<QaPair> {
    let pair = normalize_qa_pair(input)?;
    if let Some(document_id) = pair.document_id {
        store.require_document(document_id)?;
    }
    let stored = store.create_qa_pair(&pair)?;
    tracing::info!("Ingested QA pair {}", stored.id);
    Ok(stored)
}

/// Build a document from a text or markdown file.
///
/// The title defaults to the file stem.
pub fn document_from_file(
    path: &Path,
    title: Option<String>,
    subject: Option<String>,
    author: Option<String>,
) -> AppResult<NewDocument> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| AppError::Validation(format!("Failed to read {:?}: {}", path, e)))?;

    let body = match path.extension().and_then(|e| e.to_str()) {
        Some("md") | Some("markdown") => clean_markdown(&raw),
        _ => raw,
    };

    let title = title
        .filter(|t| !t.trim().is_empty())
        .or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
        })
        .unwrap_or_default();

    Ok(NewDocument {
        title,
        subject,
        author,
        body,
    })
}

/// Strip heading markers, rules and code fences.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();

        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        if !trimmed.is_empty() {
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result.trim().to_string()
}

/// Result of seeding the sample corpus.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedStats {
    pub documents: usize,
    pub qa_pairs: usize,
    /// True when the store already had documents and nothing was written
    pub skipped: bool,
}

/// Sample QA pair linked to a sample document by index.
struct SampleQa {
    document: usize,
    question: &'static str,
    answer: &'static str,
}

fn sample(title: &str, body: &str, subject: &str, author: &str) -> NewDocument {
    NewDocument {
        title: title.to_string(),
        subject: Some(subject.to_string()),
        author: Some(author.to_string()),
        body: body.to_string(),
    }
}

/// The demo corpus of five methodics.
pub fn sample_documents() -> Vec<NewDocument> {
    vec![
        sample(
            "Методика преподавания математики в школе",
            "В данном пособии рассматриваются современные подходы к преподаванию математики. \
             Учитель начинает урок с короткой устной разминки, которая настраивает учеников на работу. \
             Новые понятия вводятся через практические задачи из повседневной жизни школьников. \
             Для закрепления материала рекомендуется чередовать индивидуальную и групповую работу на занятии.",
            "Математика",
            "Иванов И.И.",
        ),
        sample(
            "Дифференциальные уравнения для начинающих",
            "Пособие по дифференциальным уравнениям с примерами и задачами для студентов. \
             Дифференциальное уравнение связывает неизвестную функцию с её производными. \
             Уравнения первого порядка с разделяющимися переменными решаются интегрированием обеих частей. \
             Каждая глава заканчивается набором упражнений для самостоятельной работы студентов.",
            "Математика",
            "Петров П.П.",
        ),
        sample(
            "Основы программирования на Python",
            "Методическое пособие по основам программирования на языке Python. \
             Python — язык программирования высокого уровня с простым и читаемым синтаксисом. \
             Студенты начинают с переменных, условий и циклов, а затем переходят к функциям. \
             На практических занятиях студенты пишут небольшие программы для обработки данных.",
            "Информатика",
            "Сидоров С.С.",
        ),
        sample(
            "Методика обучения физике",
            "Современные методы преподавания физики в средней школе. \
             Демонстрационный эксперимент помогает ученикам увидеть физическое явление до его формального описания. \
             Лабораторные работы выполняются в парах, а результаты обсуждаются в конце урока. \
             Задачи подбираются так, чтобы сложность возрастала постепенно.",
            "Физика",
            "Кузнецов К.К.",
        ),
        sample(
            "Английский язык для технических специальностей",
            "Методическое пособие по английскому языку для студентов технических вузов. \
             Основное внимание уделяется чтению технической документации и профессиональной лексике. \
             Каждое занятие включает работу с оригинальным текстом и упражнения на перевод терминов. \
             Итоговое задание курса состоит в подготовке краткой презентации о собственном проекте.",
            "Английский язык",
            "Смирнова А.А.",
        ),
    ]
}

fn sample_qa_pairs() -> Vec<SampleQa> {
    vec![
        SampleQa {
            document: 2,
            question: "Какой язык программирования изучают в курсе основ программирования?",
            answer: "В курсе изучается язык Python: переменные, условия, циклы и функции.",
        },
        SampleQa {
            document: 1,
            question: "Как решать уравнения с разделяющимися переменными?",
            answer: "Переменные разделяют по разным частям уравнения и интегрируют обе части.",
        },
        SampleQa {
            document: 3,
            question: "Как организованы лабораторные работы по физике?",
            answer: "Лабораторные работы выполняются в парах, результаты обсуждаются в конце урока.",
        },
    ]
}

/// Load the sample corpus into an empty store.
///
/// A store that already holds documents is left untouched.
pub fn seed_samples(store: &dyn MethodicStore) -> AppResult<SeedStats> {
    if store.stats()?.documents > 0 {
        tracing::info!("Store already has documents, skipping seed");
        return Ok(SeedStats {
            skipped: true,
            ..Default::default()
        });
    }

    let documents: Vec<Document> = sample_documents()
        .into_iter()
        .map(|doc| ingest_document(store, doc))
        .collect::<AppResult<_>>()?;

    let mut qa_pairs = 0;
    for qa in sample_qa_pairs() {
        let document_id = documents.get(qa.document).map(|d| d.id);
        ingest_qa_pair(
            store,
            NewQaPair {
                question: qa.question.to_string(),
                answer: qa.answer.to_string(),
                document_id,
            },
        )?;
        qa_pairs += 1;
    }

    Ok(SeedStats {
        documents: documents.len(),
        qa_pairs,
        skipped: false,
    })
}
