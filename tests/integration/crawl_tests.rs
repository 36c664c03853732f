//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the course plan site and run
//! the full cycle end-to-end: form, dependent dropdowns, listing,
//! iteration pages and elective pages, then serialization.

use curriculum_harvester::config::Config;
use curriculum_harvester::crawler::{run_crawl, Coordinator};
use curriculum_harvester::output::{format_curriculum, parse_curriculum, write_curriculum};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FORM: &str = r#"<html><body><form>
    <select name="FakulteId">
        <option value="">Seçiniz</option>
        <option value="1">Fen - Edebiyat Fakültesi</option>
        <option value="2">Mimarlık Fakültesi</option>
    </select>
    <select name="ProgramTipiId"></select>
    <select name="programKodu"></select>
    <select name="planTipiKodu"></select>
</form></body></html>"#;

/// Creates a test configuration pointed at the mock server
fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.site.base_url = base_url.to_string();
    config.crawler.workers = 2;
    config.crawler.dropdown_poll_ms = 0;
    config.crawler.dropdown_retries = 3;
    config.crawler.iteration_retries = 2;
    config.crawler.retry_backoff_ms = 0;
    config.crawler.request_timeout_secs = 5;
    config
}

async fn mount_html(server: &MockServer, page: &str, body: impl Into<String>) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.into()))
        .mount(server)
        .await;
}

async fn mount_options(server: &MockServer, endpoint: &str, query: &[(&str, &str)], body: &str) {
    let mock = query
        .iter()
        .fold(Mock::given(method("GET")).and(path(endpoint)), |mock, (key, value)| {
            mock.and(query_param(*key, *value))
        });
    mock.respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn listing(rows: &[(&str, &str)]) -> String {
    let rows: String = rows
        .iter()
        .map(|(href, label)| format!(r#"<tr><td><a href="{}">Görüntüle</a></td><td>{}</td></tr>"#, href, label))
        .collect();
    format!(
        "<table><thead><tr><th></th><th>Plan</th></tr></thead><tbody>{}</tbody></table>",
        rows
    )
}

/// Two faculties, one UOLP program each; Fen also offers a filtered-out
/// program type and plan type.
async fn mount_site(server: &MockServer, mimarlik_iteration_status: u16) {
    mount_html(server, "/public/DersPlan/", FORM).await;

    let program_types = "/public/DersPlan/GetProgramTipiByFakulteId";
    mount_options(
        server,
        program_types,
        &[("FakulteId", "1")],
        r#"<option value="">Seçiniz</option><option value="3">UOLP</option><option value="9">Yandal</option>"#,
    )
    .await;
    mount_options(
        server,
        program_types,
        &[("FakulteId", "2")],
        r#"<option value="">Seçiniz</option><option value="3">UOLP</option>"#,
    )
    .await;

    let programs = "/public/DersPlan/GetProgramByProgramTipiId";
    mount_options(
        server,
        programs,
        &[("FakulteId", "1"), ("ProgramTipiId", "3")],
        r#"<option value="FIZ_LS">Fizik Mühendisliği</option>"#,
    )
    .await;
    mount_options(
        server,
        programs,
        &[("FakulteId", "2"), ("ProgramTipiId", "3")],
        r#"<option value="MIM_LS">Mimarlık</option>"#,
    )
    .await;

    let plan_types = "/public/DersPlan/GetPlanTipiByProgramKodu";
    mount_options(
        server,
        plan_types,
        &[("programKodu", "FIZ_LS")],
        r#"<option value="lisans">Lisans</option><option value="yandal">Yandal</option>"#,
    )
    .await;
    mount_options(
        server,
        plan_types,
        &[("programKodu", "MIM_LS")],
        r#"<option value="lisans">Lisans</option>"#,
    )
    .await;

    let listings = "/public/DersPlan/DersPlanlariList";
    mount_options(
        server,
        listings,
        &[("programKodu", "FIZ_LS"), ("planTipiKodu", "lisans")],
        &listing(&[(
            "/public/DersPlan/DersPlanDetay/194",
            "Fizik Mühendisliği Lisans Programı 2021-2022 ve Sonrası",
        )]),
    )
    .await;
    mount_options(
        server,
        listings,
        &[("programKodu", "MIM_LS"), ("planTipiKodu", "lisans")],
        &listing(&[(
            "/public/DersPlan/DersPlanDetay/301",
            "Mimarlık Lisans Programı 2019-2020 ve Sonrası",
        )]),
    )
    .await;

    mount_html(
        server,
        "/public/DersPlan/DersPlanDetay/194",
        r#"<html><body>
        <table><thead><tr><th>Kod</th><th>Ad</th></tr></thead><tbody>
            <tr><td><a href="/public/Ders/FIZ101">FIZ 101</a></td><td>Fizik I</td></tr>
            <tr><td><a href="/public/Ders/MAT103">MAT 103</a></td><td>Matematik I</td></tr>
        </tbody></table>
        <table><thead><tr><th>Kod</th><th>Ad</th></tr></thead><tbody>
            <tr><td><a href="/public/Ders/FIZ102">FIZ 102</a></td><td>Fizik II</td></tr>
            <tr><td><a href="/public/DersPlan/SecmeliDersler/55">Dersler</a></td><td>Seçmeli</td></tr>
        </tbody></table>
        </body></html>"#,
    )
    .await;
    mount_html(
        server,
        "/public/DersPlan/SecmeliDersler/55",
        r#"<table>
            <tr><th>Kod</th></tr>
            <tr><td><a href="/public/Ders/HSS201">HSS 201</a></td></tr>
            <tr><td><a href="/public/Ders/MST261">MST 261</a></td></tr>
        </table>"#,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/public/DersPlan/DersPlanDetay/301"))
        .respond_with(ResponseTemplate::new(mimarlik_iteration_status).set_body_string(
            r#"<table><tbody>
                <tr><td><a href="/public/Ders/MIM101">MIM 101</a></td><td>Tasarım I</td></tr>
            </tbody></table>"#,
        ))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_writes_every_faculty() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server, 200).await;

    let outcome = run_crawl(create_test_config(&mock_server.uri()), &[])
        .await
        .expect("crawl should succeed");

    let text = format_curriculum(&outcome.curriculum);
    let expected_fen = "# Fen - Edebiyat Fakültesi\n\
                        ## Fizik Mühendisliği Lisans Programı (UOLP)\n\
                        ### 2021-2022 ve Sonrası\n\
                        FIZ 101=MAT 103\n\
                        FIZ 102=[Seçmeli*(HSS 201|MST 261)]\n\
                        \n\n\n\n\n\n";
    assert!(
        text.starts_with(expected_fen),
        "unexpected output:\n{}",
        text
    );
    assert!(text.contains("# Mimarlık Fakültesi\n## Mimarlık Lisans Programı (UOLP)\n### 2019-2020 ve Sonrası\nMIM 101\n"));

    assert_eq!(outcome.stats.faculties_kept, 2);
    assert_eq!(outcome.stats.iterations_kept, 2);
    assert_eq!(outcome.stats.sessions.iterations_failed, 0);

    let codes = outcome.curriculum.course_codes();
    assert!(codes.contains("HSS 201"));
    assert!(codes.contains("MIM 101"));
}

#[tokio::test]
async fn test_faculty_restriction() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server, 200).await;

    let only = vec!["Mimarlık Fakültesi".to_string(), "Kapanmış Fakülte".to_string()];
    let outcome = run_crawl(create_test_config(&mock_server.uri()), &only)
        .await
        .expect("crawl should succeed");

    let names: Vec<&str> = outcome
        .curriculum
        .faculties
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(names, vec!["Mimarlık Fakültesi"]);
    assert_eq!(outcome.stats.faculties_total, 1);
}

#[tokio::test]
async fn test_failed_iteration_is_not_written() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server, 503).await;

    let outcome = run_crawl(create_test_config(&mock_server.uri()), &[])
        .await
        .expect("crawl should succeed");

    assert_eq!(outcome.stats.sessions.iterations_failed, 1);
    let text = format_curriculum(&outcome.curriculum);
    assert!(text.contains("# Fen - Edebiyat Fakültesi"));
    assert!(!text.contains("Mimarlık"));
}

#[tokio::test]
async fn test_written_file_reads_back() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server, 200).await;

    let coordinator =
        Coordinator::new(create_test_config(&mock_server.uri())).expect("coordinator should build");
    let faculties = coordinator
        .discover_faculties()
        .await
        .expect("form should load");
    assert_eq!(faculties, vec!["Fen - Edebiyat Fakültesi", "Mimarlık Fakültesi"]);

    let outcome = coordinator.run(&faculties, 1).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("data").join("course_plans.txt");
    write_curriculum(&outcome.curriculum, &output).unwrap();

    let parsed = parse_curriculum(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(parsed.iteration_count(), 2);
    assert_eq!(parsed.course_codes(), outcome.curriculum.course_codes());
}
