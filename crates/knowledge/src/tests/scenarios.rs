use super::*;
use crate::chat::NOTHING_FOUND_ANSWER;
use crate::types::{AnswerSource, ChatRequest};

const PYTHON_BODY: &str = "Python — язык программирования высокого уровня, который широко используется в обучении студентов. \
Программы на Python читаются легко, поэтому язык удобен для первых занятий по программированию.";

const PHYSICS_BODY: &str = "Лабораторные работы помогают студентам понять законы механики. \
Эксперименты проводятся в малых группах под руководством преподавателя.";

const SQL_BODY: &str = "Сиквел — жаргонное название языка SQL, который применяется для работы с базами данных. \
Запросы пишутся на декларативном языке и описывают результат, а не алгоритм.";

const GOOD_ANSWER: &str =
    "Python — язык программирования высокого уровня, который используется в обучении студентов.";

fn python_corpus() -> Arc<SqliteStore> {
    let store = empty_store();
    add_document(
        &store,
        "Основы программирования на Python",
        PYTHON_BODY,
        Some("Иванов И.И."),
    );
    add_document(&store, "Методика обучения физике", PHYSICS_BODY, None);
    store
}

#[tokio::test]
async fn test_python_question_is_grounded_in_methodic() {
    let client = MockClient::answering(GOOD_ANSWER);
    let service = service(python_corpus(), client.clone());

    let response = service.answer(&ChatRequest::new("Что такое Python?")).await.unwrap();

    assert_eq!(response.origin, AnswerSource::Llm);
    assert_eq!(response.answer, GOOD_ANSWER);
    assert_eq!(response.found_count, 1);
    assert_eq!(response.sources.len(), 1);
    assert_eq!(response.sources[0].title, "Основы программирования на Python");
    assert_eq!(response.sources[0].author.as_deref(), Some("Иванов И.И."));
    assert!(response.sources[0].snippet.contains("Python"));

    assert_eq!(client.calls(), 1);
    let prompt = client.last_prompt();
    assert!(prompt.contains("Методичка №1: Основы программирования на Python"));
    assert!(prompt.contains("ПРАВИЛА ОТВЕТА"));
    assert!(!prompt.contains("Методика обучения физике"));
}

#[tokio::test]
async fn test_paraphrase_below_shortcut_threshold_falls_through() {
    let store = empty_store();
    let doc = add_document(&store, "Базы данных", SQL_BODY, Some("Сидоров С.С."));
    add_qa(&store, "Что такое SQL?", "SQL — язык запросов.", Some(doc.id));
    let client = MockClient::answering(
        "Сиквел — это разговорное название SQL, языка запросов к базам данных.",
    );
    let service = service(store, client.clone());

    let response = service.answer(&ChatRequest::new("что такое сиквел")).await.unwrap();

    assert_ne!(response.origin, AnswerSource::QaMatch);
    assert_ne!(response.answer, "SQL — язык запросов.");
    assert_eq!(response.found_count, 1);
    assert_eq!(client.calls(), 1);
    // Related pair still reaches the prompt
    assert!(client.last_prompt().contains("Вопрос: Что такое SQL?"));
}

#[tokio::test]
async fn test_paraphrase_with_lowered_threshold_uses_stored_answer() {
    let store = empty_store();
    let doc = add_document(&store, "Базы данных", SQL_BODY, None);
    add_qa(&store, "Что такое SQL?", "SQL — язык запросов.", Some(doc.id));
    let client = MockClient::answering(GOOD_ANSWER);
    let service = service(store, client.clone());

    let mut request = ChatRequest::new("что такое сиквел");
    request.similarity_threshold = Some(0.6);
    let response = service.answer(&request).await.unwrap();

    assert_eq!(response.origin, AnswerSource::QaMatch);
    assert_eq!(response.answer, "SQL — язык запросов.");
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_exact_qa_match_short_circuits() {
    let store = empty_store();
    let doc = add_document(&store, "Базы данных", SQL_BODY, None);
    add_qa(&store, "Что такое SQL?", "SQL — язык запросов.", Some(doc.id));
    let client = MockClient::answering(GOOD_ANSWER);
    let service = service(store, client.clone());

    let response = service.answer(&ChatRequest::new("Что такое SQL?")).await.unwrap();

    assert_eq!(response.origin, AnswerSource::QaMatch);
    assert_eq!(response.answer, "SQL — язык запросов.");
    assert_eq!(response.found_count, 1);
    assert_eq!(response.sources.len(), 1);
    assert_eq!(response.sources[0].id, doc.id);
    assert_eq!(response.sources[0].snippet, "Связанный вопрос: Что такое SQL?...");
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_several_qa_matches_are_combined() {
    let store = empty_store();
    add_qa(&store, "Что такое SQL?", "SQL — язык запросов.", None);
    add_qa(&store, "Что такое SQL!", "Язык для работы с таблицами.", None);
    let service = service(store, MockClient::answering(GOOD_ANSWER));

    let response = service.answer(&ChatRequest::new("Что такое SQL?")).await.unwrap();

    assert_eq!(response.origin, AnswerSource::QaMatch);
    assert_eq!(response.found_count, 2);
    assert!(response.sources.is_empty());
    assert_eq!(
        response.answer,
        "Найдено несколько похожих вопросов:\n\n1. SQL — язык запросов.\n\n2. Язык для работы с таблицами."
    );
}

#[tokio::test]
async fn test_empty_corpus_reports_nothing_found() {
    let client = MockClient::answering(GOOD_ANSWER);
    let service = service(empty_store(), client.clone());

    let response = service.answer(&ChatRequest::new("Что такое Python?")).await.unwrap();

    assert_eq!(response.answer, NOTHING_FOUND_ANSWER);
    assert!(response.sources.is_empty());
    assert_eq!(response.found_count, 0);
    assert_eq!(response.origin, AnswerSource::NothingFound);
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_blank_question_reports_nothing_found() {
    let service = service(python_corpus(), MockClient::answering(GOOD_ANSWER));

    let response = service.answer(&ChatRequest::new("   ")).await.unwrap();

    assert_eq!(response.origin, AnswerSource::NothingFound);
    assert_eq!(response.found_count, 0);
}

#[tokio::test]
async fn test_llm_timeout_uses_fallback() {
    let client = MockClient::slow(Duration::from_secs(2));
    let service = service_with(python_corpus(), client.clone(), Duration::from_millis(50));

    let response = service.answer(&ChatRequest::new("Что такое Python?")).await.unwrap();

    assert_eq!(response.origin, AnswerSource::Fallback);
    assert!(response.answer.starts_with("На основе анализа методических материалов:"));
    assert!(response.answer.contains("1. Python — язык программирования высокого уровня"));
    assert_eq!(response.found_count, 1);
    assert_eq!(response.sources.len(), 1);
}

#[tokio::test]
async fn test_llm_error_uses_fallback() {
    let service = service(python_corpus(), MockClient::failing());

    let response = service.answer(&ChatRequest::new("Что такое Python?")).await.unwrap();

    assert_eq!(response.origin, AnswerSource::Fallback);
    assert!(response.answer.contains("Python"));
}

#[tokio::test]
async fn test_rejected_answer_uses_fallback() {
    let client = MockClient::answering("Не знаю.");
    let service = service(python_corpus(), client.clone());

    let response = service.answer(&ChatRequest::new("Что такое Python?")).await.unwrap();

    assert_eq!(client.calls(), 1);
    assert_eq!(response.origin, AnswerSource::Fallback);
    assert_ne!(response.answer, "Не знаю.");
}

#[tokio::test]
async fn test_full_flag_returns_whole_body() {
    let service = service(python_corpus(), MockClient::answering(GOOD_ANSWER));

    let mut request = ChatRequest::new("Что такое Python?");
    request.full = true;
    let response = service.answer(&request).await.unwrap();

    assert_eq!(response.sources[0].snippet, PYTHON_BODY);
}

#[tokio::test]
async fn test_repeated_questions_give_identical_sources() {
    let service = service(python_corpus(), MockClient::answering(GOOD_ANSWER));
    let request = ChatRequest::new("Что такое Python?");

    let first = service.answer(&request).await.unwrap();
    let second = service.answer(&request).await.unwrap();

    assert_eq!(first.answer, second.answer);
    assert_eq!(first.sources, second.sources);
    assert_eq!(first.found_count, second.found_count);
}

#[tokio::test]
async fn test_unavailable_summarizer_answers_from_material() {
    let summarizer = Summarizer::unavailable(
        "no API key",
        SummarizerSettings::default(),
        default_prompt().unwrap(),
    );
    let service = ChatService::new(python_corpus(), summarizer, RetrievalConfig::default());

    let response = service.answer(&ChatRequest::new("Что такое Python?")).await.unwrap();

    assert_eq!(response.origin, AnswerSource::Fallback);
    assert!(response.answer.contains("Python"));
}

#[test]
fn test_search_documents_matches_any_field() {
    let store = python_corpus();
    let service = service(store, MockClient::answering(GOOD_ANSWER));

    let by_author = service.search_documents("Иванов", 10).unwrap();
    assert_eq!(by_author.len(), 1);
    assert_eq!(by_author[0].title, "Основы программирования на Python");

    let by_body = service.search_documents("механики", 10).unwrap();
    assert_eq!(by_body.len(), 1);
    assert_eq!(by_body[0].title, "Методика обучения физике");

    assert!(service.search_documents("в и на", 10).unwrap().is_empty());
}

struct LineSplitter;

impl crate::sentences::SentenceSplitter for LineSplitter {
    fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
    }
}

#[tokio::test]
async fn test_custom_splitter_drives_fallback() {
    let store = empty_store();
    add_document(
        &store,
        "Заметки",
        "Первая строка про Python без точки в конце\nВторая строка про Python тоже без точки",
        None,
    );
    let service = service(store, MockClient::failing()).with_splitter(Arc::new(LineSplitter));

    let response = service.answer(&ChatRequest::new("Что такое Python?")).await.unwrap();

    assert_eq!(response.origin, AnswerSource::Fallback);
    assert!(response.answer.contains("1. Первая строка про Python"));
    assert!(response.answer.contains("2. Вторая строка про Python"));
}

#[tokio::test]
async fn test_out_of_range_threshold_is_rejected() {
    let store = empty_store();
    add_qa(&store, "Что такое SQL?", "SQL — язык запросов.", None);
    let client = MockClient::answering(GOOD_ANSWER);
    let service = service(store, client.clone());

    for threshold in [-5.0, 1.5, f64::NAN] {
        let mut request = ChatRequest::new("Как варить борщ?");
        request.similarity_threshold = Some(threshold);
        let result = service.answer(&request).await;
        assert!(matches!(result, Err(AppError::Validation(_))), "{threshold}");
    }
    assert_eq!(client.calls(), 0);

    let mut request = ChatRequest::new("Как варить борщ?");
    request.similarity_threshold = Some(0.0);
    let response = service.answer(&request).await.unwrap();
    assert_eq!(response.origin, AnswerSource::QaMatch);
}

#[tokio::test]
async fn test_qa_table_is_scanned_once_per_question() {
    let store = CountingStore::new();
    let doc = add_document(store.inner(), "Базы данных", SQL_BODY, None);
    add_qa(store.inner(), "Что такое SQL?", "SQL — язык запросов.", Some(doc.id));
    let client = MockClient::answering(
        "Сиквел — это разговорное название SQL, языка запросов к базам данных.",
    );
    let service = ChatService::new(
        store.clone(),
        Summarizer::new(client.clone(), SummarizerSettings::default(), default_prompt().unwrap()),
        RetrievalConfig::default(),
    );

    let response = service.answer(&ChatRequest::new("что такое сиквел")).await.unwrap();

    assert_ne!(response.origin, AnswerSource::QaMatch);
    assert_eq!(store.scans(), 1);
    assert!(client.last_prompt().contains("Вопрос: Что такое SQL?"));
}
