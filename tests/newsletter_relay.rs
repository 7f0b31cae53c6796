use httpmock::MockServer;
use url::Url;
use visuopost::application::newsletter::{NewsletterRelay, NewsletterService, SignupMetadata};
use visuopost::domain::newsletter::EmailAddress;
use visuopost::infra::relay::FormRelayClient;

fn metadata() -> SignupMetadata {
    SignupMetadata {
        access_key: "relay-key".to_string(),
        subject: "New Newsletter Signup".to_string(),
        from_name: "My Blog".to_string(),
        redirect: "https://visuopost.netlify.app".to_string(),
    }
}

#[tokio::test]
async fn relay_posts_url_encoded_form() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path("/submit")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(
                "access_key=relay-key&subject=New+Newsletter+Signup&from_name=My+Blog\
                 &redirect=https%3A%2F%2Fvisuopost.netlify.app&botcheck=&email=reader%40example.com",
            );
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"success":true}"#);
    });

    let client =
        FormRelayClient::new(Url::parse(&server.url("/submit")).expect("url")).expect("client");
    let email = EmailAddress::parse("reader@example.com").expect("email");
    client
        .submit(NewsletterService::build_form(&metadata(), &email))
        .await
        .expect("submit");
    mock.assert();
}

#[tokio::test]
async fn relay_rejection_is_not_an_error() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST").path("/submit");
        then.status(400).body(r#"{"success":false}"#);
    });

    let client =
        FormRelayClient::new(Url::parse(&server.url("/submit")).expect("url")).expect("client");
    let email = EmailAddress::parse("reader@example.com").expect("email");
    assert!(
        client
            .submit(NewsletterService::build_form(&metadata(), &email))
            .await
            .is_ok()
    );
    mock.assert();
}

#[tokio::test]
async fn unreachable_relay_is_a_transport_error() {
    // Nothing listens on the discard port.
    let client = FormRelayClient::new(Url::parse("http://127.0.0.1:9/submit").expect("url"))
        .expect("client");
    let email = EmailAddress::parse("reader@example.com").expect("email");
    assert!(
        client
            .submit(NewsletterService::build_form(&metadata(), &email))
            .await
            .is_err()
    );
}
