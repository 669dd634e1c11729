//! Marketplace flows against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives the service layer
//! and the page controllers over real HTTP with `UreqTransport`. This is
//! where schema drift between the client DTOs and the server's JSON shows
//! up.

use std::sync::Arc;
use std::time::Duration;

use evmarket_core::pages::submit::{CREATED, LOGIN_REQUIRED, REDIRECT_DELAY};
use evmarket_core::pages::{BackendStatus, BrowsePage, HomePage, ListingKind, Route, SubmitListingPage, SubmitOutcome};
use evmarket_core::types::{ImageUpload, RegisterRequest, SubscriptionLimits};
use evmarket_core::{
    ApiClient, ApiError, ListingService, ListingStatus, SearchParams, Session, UpdateListingRequest,
    UreqTransport,
};

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn service_for(base: &str, session: &Arc<Session>) -> ListingService<UreqTransport> {
    ListingService::new(ApiClient::new(base, Arc::clone(session)), UreqTransport::new())
}

fn register(service: &ListingService<UreqTransport>, name: &str, email: &str) -> String {
    let auth = service
        .register(&RegisterRequest {
            user_name: name.to_string(),
            email: email.to_string(),
            password: "secret".to_string(),
            phone: None,
        })
        .unwrap();
    service.client().session().set_token(&auth.token).unwrap();
    auth.user_id
}

fn fill(page: &mut SubmitListingPage, fields: &[(&str, &str)]) {
    for (name, value) in fields {
        page.set_field_by_name(name, value).unwrap();
    }
}

const VEHICLE: &[(&str, &str)] = &[
    ("title", "VinFast VF8 2023"),
    ("description", "One owner"),
    ("brand", "VinFast"),
    ("model", "VF8"),
    ("year", "2023"),
    ("seats", "5"),
    ("mileage", "12000"),
    ("price", "30000"),
    ("contract", "0901234567"),
    ("agreeTerms", "on"),
];

const BATTERY: &[(&str, &str)] = &[
    ("title", "LG Chem 60kWh pack"),
    ("brand", "LG"),
    ("model", "E63"),
    ("year", "2022"),
    ("capacity", "60"),
    ("voltage", "400"),
    ("batteryLifeRemaining", "85"),
    ("price", "4500"),
    ("contract", "0907654321"),
    ("agreeTerms", "on"),
];

#[test]
fn marketplace_lifecycle() {
    let base = start_server();
    let session = Arc::new(Session::anonymous());
    let service = service_for(&base, &session);

    // Backend is up and empty.
    let status = BackendStatus::check(&service);
    assert_eq!(status.label(), "✅ Backend Connected");
    let names: Vec<String> = service.get_categories().into_iter().map(|c| c.category_name).collect();
    assert_eq!(names, ["Electric Car", "Motorbike", "Battery"]);

    let mut browse = BrowsePage::new(10);
    let ticket = browse.load();
    assert!(browse.refresh(&service, &ticket));
    assert!(browse.is_empty());
    assert!(!browse.shows_pagination());

    // Signed out: the form refuses before any request.
    assert_eq!(SubmitListingPage::guard(&session).map(|n| n.to), Some(Route::Login));
    let mut form = SubmitListingPage::vehicle();
    fill(&mut form, VEHICLE);
    assert_eq!(form.submit(&service), SubmitOutcome::NotSignedIn);
    assert_eq!(form.error(), Some(LOGIN_REQUIRED));

    // First seller registers and posts a vehicle.
    let seller_a = register(&service, "An", "an@example.com");
    assert!(SubmitListingPage::guard(&session).is_none());
    assert_eq!(
        service.check_subscription_limits(),
        SubscriptionLimits {
            max_listings: 1,
            current_listings: 0,
            can_post: true,
            subscription_type: "FREE".to_string(),
        }
    );
    assert!(service.can_user_create_listing().can_create);
    assert_eq!(service.get_current_user_subscription(), None);

    let vehicle = match form.submit(&service) {
        SubmitOutcome::Created(listing) => listing,
        other => panic!("expected created, got {other:?}"),
    };
    assert_eq!(form.success(), Some(CREATED));
    assert!(form.error().is_none());
    assert!(form.draft().title.is_empty(), "form resets after success");
    let nav = form.take_navigation().unwrap();
    assert_eq!(nav.to, Route::Listings);
    assert_eq!(nav.after, REDIRECT_DELAY);
    assert_eq!(vehicle.seller.user_id, seller_a);
    assert_eq!(vehicle.status, ListingStatus::Active);
    assert_eq!(vehicle.seats, Some(5));
    assert_eq!(vehicle.category.category_id, 1);

    // Free tier is now used up.
    let permission = service.can_user_create_listing();
    assert!(!permission.can_create);
    assert!(permission.upgrade_needed);
    assert_eq!(
        permission.reason.as_deref(),
        Some("You have reached the maximum number of listings (1) for your FREE subscription.")
    );
    let mut second = SubmitListingPage::vehicle();
    fill(&mut second, VEHICLE);
    match second.submit(&service) {
        SubmitOutcome::Failed(message) => {
            assert_eq!(message, "You have reached the maximum number of listings (1) for your FREE subscription.")
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(second.take_navigation().is_none());

    // Images go to the seller's own listing.
    let urls = service
        .upload_listing_images(
            &vehicle.listing_id,
            &[ImageUpload {
                file_name: "front.jpg".to_string(),
                content_type: "image/jpeg".to_string(),
                bytes: b"\xff\xd8\xff\xe0fake-jpeg".to_vec(),
            }],
        )
        .unwrap();
    assert_eq!(urls.len(), 1);
    assert!(urls[0].ends_with("front.jpg"));

    // Second seller posts a battery.
    let seller_b = register(&service, "Binh", "binh@example.com");
    let mut battery_form = SubmitListingPage::battery();
    assert_eq!(battery_form.kind(), ListingKind::Battery);
    fill(&mut battery_form, BATTERY);
    let battery = match battery_form.submit(&service) {
        SubmitOutcome::Created(listing) => listing,
        other => panic!("expected created, got {other:?}"),
    };
    assert_eq!(battery.category.category_id, 3);
    assert_eq!(battery.battery_life_remaining, Some(85.0));

    // Browsing: everything, one category, text search, zero category.
    let ticket = browse.load();
    browse.refresh(&service, &ticket);
    assert_eq!(browse.listings().len(), 2);
    assert_eq!(browse.listings()[0].listing_id, battery.listing_id, "newest first");

    let ticket = browse.select_category(Some(3));
    browse.refresh(&service, &ticket);
    assert_eq!(browse.listings().len(), 1);
    assert_eq!(browse.listings()[0].title, "LG Chem 60kWh pack");

    browse.set_search_query("vinfast");
    let ticket = browse.select_category(None);
    browse.refresh(&service, &ticket);
    assert_eq!(browse.listings().len(), 1);
    assert_eq!(browse.listings()[0].listing_id, vehicle.listing_id);

    let ticket = browse.select_category(Some(0));
    browse.refresh(&service, &ticket);
    assert!(browse.is_empty(), "category 0 is a real filter");

    let page = service
        .search_listings(&SearchParams {
            min_price: Some(1000.0),
            max_price: Some(5000.0),
            ..SearchParams::new("")
        })
        .unwrap();
    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0].listing_id, battery.listing_id);

    let mine = service.get_user_listings(&seller_b, 0, 10).unwrap();
    assert_eq!(mine.total_elements, 1);
    let by_category = service.get_listings_by_category(1, 0, 10).unwrap();
    assert_eq!(by_category.content[0].seller.user_id, seller_a);

    let mut home = HomePage::new();
    home.load(&service);
    assert_eq!(home.featured().len(), 2);

    // Owner edits and deletes; strangers cannot.
    let err = service.delete_listing(&vehicle.listing_id).unwrap_err();
    assert_eq!(err.status(), Some(403));

    let auth = service.login("an@example.com", "secret").unwrap();
    assert_eq!(auth.user_id, seller_a);
    session.set_token(&auth.token).unwrap();

    let updated = service
        .update_listing(
            &vehicle.listing_id,
            &UpdateListingRequest {
                price: Some(28000.0),
                ..UpdateListingRequest::default()
            },
        )
        .unwrap();
    assert_eq!(updated.price, 28000.0);
    assert_eq!(updated.title, vehicle.title);
    assert!(updated.updated_at.is_some());
    assert_eq!(service.get_listing_by_id(&vehicle.listing_id).unwrap().price, 28000.0);

    service.delete_listing(&vehicle.listing_id).unwrap();
    let err = service.get_listing_by_id(&vehicle.listing_id).unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 404, .. }));
    assert!(service.can_user_create_listing().can_create, "slot freed by delete");

    // Bad credentials surface the server's message.
    let err = service.login("an@example.com", "wrong").unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.server_message().as_deref(), Some("Invalid email or password"));

    session.clear().unwrap();
    assert!(!session.is_authenticated());
}

#[test]
fn unreachable_backend_falls_back() {
    // Bind and release a port so nothing is listening on it.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let session = Arc::new(Session::with_token("stale"));
    let service = service_for(&format!("http://{addr}"), &session);

    let status = BackendStatus::check(&service);
    assert_eq!(status.label(), "❌ Backend Disconnected");

    let ids: Vec<i64> = service.get_categories().iter().map(|c| c.category_id).collect();
    assert_eq!(ids, [1, 2, 3]);
    assert_eq!(service.check_subscription_limits(), SubscriptionLimits::free_tier());
    assert!(service.can_user_create_listing().can_create);
    assert_eq!(service.get_current_user_subscription(), None);

    let err = service.get_listings(0, 10).unwrap_err();
    assert!(matches!(err, ApiError::Network(_)), "got {err:?}");

    let mut browse = BrowsePage::new(10);
    let ticket = browse.load();
    browse.refresh(&service, &ticket);
    assert_eq!(browse.error(), Some("Failed to load listings"));
    assert!(!browse.is_loading());

    let mut form = SubmitListingPage::vehicle();
    fill(&mut form, VEHICLE);
    assert!(matches!(form.submit(&service), SubmitOutcome::Failed(_)));
    assert!(form.success().is_none());
    assert!(form.take_navigation().is_none());

    let started = std::time::Instant::now();
    let mut home = HomePage::new();
    home.load(&service);
    assert!(home.featured().is_empty());
    assert!(started.elapsed() < Duration::from_secs(30));
}
