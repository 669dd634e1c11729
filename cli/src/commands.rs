//! Subcommand handlers. Each one drives a page controller or a service call
//! and prints the result as plain text.

use std::path::Path;

use anyhow::{anyhow, bail, Context};
use evmarket_core::format::{format_date, format_price, listing_highlights, subscription_priority};
use evmarket_core::pages::{
    BackendStatus, BrowsePage, HomePage, ListingKind, Navigation, SubmitListingPage, SubmitOutcome,
};
use evmarket_core::types::{ImageUpload, RegisterRequest};
use evmarket_core::{ClientConfig, Listing, ListingService, UpdateListingRequest, UreqTransport};

use crate::Command;

type Service = ListingService<UreqTransport>;

pub fn run(service: &Service, config: &ClientConfig, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Health => {
            let status = BackendStatus::check(service);
            println!("{}", status.label());
            match status {
                BackendStatus::Connected(body) => println!("{}", body_text(&body)),
                BackendStatus::Disconnected(reason) => println!("{reason}"),
            }
        }
        Command::Home => {
            let mut home = HomePage::new();
            home.load(service);
            if home.featured().is_empty() {
                println!("No featured listings.");
            }
            for listing in home.featured() {
                print_card(listing);
            }
        }
        Command::Categories => {
            for category in service.get_categories() {
                println!("{:>3}  {}", category.category_id, category.category_name);
            }
        }
        Command::Browse { category, query, page } => browse(service, config, category, query, page)?,
        Command::Show { id } => {
            let listing = service.get_listing_by_id(&id)?;
            print_detail(&listing);
        }
        Command::User { id, page } => {
            let result = service.get_user_listings(&id, page.saturating_sub(1), config.page_size)?;
            for listing in &result.content {
                print_card(listing);
            }
            println!("page {} of {}", result.number + 1, result.total_pages.max(1));
        }
        Command::Post { kind, fields, agree_terms, images } => {
            post(service, kind.into(), &fields, agree_terms, &images)?
        }
        Command::Edit { id, title, description, price, contract } => {
            let update = UpdateListingRequest {
                title,
                description,
                price,
                contract,
                ..UpdateListingRequest::default()
            };
            let listing = service.update_listing(&id, &update)?;
            print_detail(&listing);
        }
        Command::Delete { id } => {
            service.delete_listing(&id)?;
            println!("Deleted {id}");
        }
        Command::Limits => limits(service),
        Command::Login { email, password } => {
            let auth = service.login(&email, &password)?;
            service.client().session().set_token(&auth.token)?;
            println!("Signed in as {} ({})", auth.user_name, auth.user_id);
        }
        Command::Register { name, email, password, phone } => {
            let auth = service.register(&RegisterRequest {
                user_name: name,
                email,
                password,
                phone,
            })?;
            service.client().session().set_token(&auth.token)?;
            println!("Registered {} ({})", auth.user_name, auth.user_id);
        }
        Command::Logout => {
            service.client().session().clear()?;
            println!("Signed out");
        }
    }
    Ok(())
}

fn browse(
    service: &Service,
    config: &ClientConfig,
    category: Option<i64>,
    query: Option<String>,
    page: u32,
) -> anyhow::Result<()> {
    let mut view = BrowsePage::new(config.page_size);
    let mut ticket = view.load();
    if let Some(query) = query {
        view.set_search_query(&query);
        ticket = view.submit_search();
    }
    if category.is_some() {
        ticket = view.select_category(category);
    }
    view.refresh(service, &ticket);

    if page > 1 {
        match view.go_to_page(page - 1) {
            Some(ticket) => {
                view.refresh(service, &ticket);
            }
            None => bail!("page {page} is out of range (1..={})", view.total_pages().max(1)),
        }
    }

    if let Some(error) = view.error() {
        bail!("{error}");
    }
    if view.is_empty() {
        println!("No listings found.");
        return Ok(());
    }
    for listing in view.listings() {
        print_card(listing);
    }
    if view.shows_pagination() {
        println!(
            "page {} of {}{}{}",
            view.current_page() + 1,
            view.total_pages(),
            if view.has_previous() { "  [prev]" } else { "" },
            if view.has_next() { "  [next]" } else { "" },
        );
    }
    Ok(())
}

fn post(
    service: &Service,
    kind: ListingKind,
    fields: &[(String, String)],
    agree_terms: bool,
    images: &[std::path::PathBuf],
) -> anyhow::Result<()> {
    if let Some(nav) = SubmitListingPage::guard(service.client().session()) {
        print_navigation(&nav);
        bail!("Please login to create a listing");
    }

    let permission = service.can_user_create_listing();
    if !permission.can_create {
        let reason = permission.reason.unwrap_or_default();
        if permission.upgrade_needed {
            bail!("{reason} Upgrade your plan to post more.");
        }
        bail!("{reason}");
    }

    let uploads = images
        .iter()
        .map(|path| read_image(path))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut page = SubmitListingPage::new(kind);
    println!("{}", kind.heading());
    for (name, value) in fields {
        page.set_field_by_name(name, value)
            .with_context(|| format!("--set {name}"))?;
    }
    if agree_terms {
        page.set_field_by_name("agreeTerms", "on")?;
    }

    match page.submit(service) {
        SubmitOutcome::Created(listing) => {
            if let Some(success) = page.success() {
                println!("{success}");
            }
            print_detail(&listing);
            if !uploads.is_empty() {
                let urls = service.upload_listing_images(&listing.listing_id, &uploads)?;
                for url in urls {
                    println!("  image: {url}");
                }
            }
            if let Some(nav) = page.take_navigation() {
                print_navigation(&nav);
            }
            Ok(())
        }
        SubmitOutcome::NotSignedIn | SubmitOutcome::Invalid(_) | SubmitOutcome::Failed(_) => {
            Err(anyhow!(page.error().unwrap_or("Failed to create listing").to_string()))
        }
    }
}

fn limits(service: &Service) {
    let limits = service.check_subscription_limits();
    let tier = service.get_current_user_subscription();
    println!("plan:      {}", limits.subscription_type);
    println!("priority:  {}", subscription_priority(tier.as_ref()));
    println!("listings:  {} / {}", limits.current_listings, limits.max_listings);
    let permission = service.can_user_create_listing();
    match permission.reason {
        Some(reason) => println!("{reason}"),
        None => println!("You can post a new listing."),
    }
}

fn read_image(path: &Path) -> anyhow::Result<ImageUpload> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    Ok(ImageUpload {
        content_type: content_type_for(path).to_string(),
        file_name,
        bytes,
    })
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

fn body_text(body: &evmarket_core::ResponseBody) -> String {
    match body {
        evmarket_core::ResponseBody::Json(value) => value.to_string(),
        evmarket_core::ResponseBody::Text(text) => text.clone(),
    }
}

fn print_navigation(nav: &Navigation) {
    if nav.after.is_zero() {
        println!("-> {}", nav.to.path());
    } else {
        println!("-> {} in {}s", nav.to.path(), nav.after.as_secs());
    }
}

fn print_card(listing: &Listing) {
    println!(
        "{}  {}  {}  [{}]",
        listing.listing_id,
        listing.title,
        format_price(listing.price),
        listing.status.as_str()
    );
    println!(
        "    {} {} {} · {}",
        listing.brand,
        listing.model,
        listing.year,
        format_date(&listing.created_at)
    );
    for line in listing_highlights(listing) {
        println!("    {line}");
    }
}

fn print_detail(listing: &Listing) {
    print_card(listing);
    if !listing.description.is_empty() {
        println!("    {}", listing.description);
    }
    println!("    category: {}", listing.category.category_name);
    println!("    seller:   {}", listing.seller.user_name);
    println!("    contact:  {}", listing.contract);
    if let Some(warranty) = &listing.warranty_info {
        println!("    warranty: {warranty}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for(Path::new("a/front.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("side.png")), "image/png");
        assert_eq!(content_type_for(Path::new("notes")), "application/octet-stream");
    }
}
