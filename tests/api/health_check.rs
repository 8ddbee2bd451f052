use crate::helpers::TestApp;

#[tokio::test]
async fn health_check_works() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app.get_health_check().await;

    assert!(response.status().is_success());
    assert_eq!(Some(0), response.content_length())
}

