/// MyAnimeList detail page provider
///
/// Fetches `https://myanimelist.net/anime/{id}` (or a configured template)
/// and scrapes the synopsis, cover image and promotional video link.
use std::time::Duration;

use chrono::Utc;
use reqwest::Client as HttpClient;
use scraper::{ElementRef, Html, Selector};
use tracing::instrument;

use crate::{
    error::{AppError, AppResult},
    models::{ItemId, MetadataRecord},
    services::providers::MetadataResolver,
};

/// Placeholder in the URL template replaced by the item identifier
pub const ID_PLACEHOLDER: &str = "{id}";

const SYNOPSIS_SELECTOR: &str = r#"p[itemprop="description"]"#;
const IMAGE_SELECTOR: &str = r#"img[itemprop="image"]"#;
const TRAILER_SELECTOR: &str = r#"a[class="iframe js-fancybox-video video-unit promotion"]"#;

#[derive(Clone)]
pub struct MyAnimeListResolver {
    http_client: HttpClient,
    url_template: String,
}

impl MyAnimeListResolver {
    /// Creates a resolver; `timeout` of `None` leaves requests unbounded
    pub fn new(url_template: String, timeout: Option<Duration>) -> AppResult<Self> {
        if !url_template.contains(ID_PLACEHOLDER) {
            return Err(AppError::InvalidInput(format!(
                "detail URL template '{}' lacks the {} placeholder",
                url_template, ID_PLACEHOLDER
            )));
        }

        let mut builder = HttpClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http_client: builder.build()?,
            url_template,
        })
    }

    pub fn detail_url(&self, id: ItemId) -> String {
        self.url_template.replace(ID_PLACEHOLDER, &id.to_string())
    }
}

#[async_trait::async_trait]
impl MetadataResolver for MyAnimeListResolver {
    #[instrument(skip(self), fields(provider = self.name()))]
    async fn fetch(&self, id: ItemId) -> AppResult<MetadataRecord> {
        let url = self.detail_url(id);
        let response = self.http_client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::Fetch(format!(
                "{} returned status {}",
                url,
                response.status()
            )));
        }

        let html = response.text().await?;
        let record = parse_detail_page(url, &html)?;

        tracing::debug!(
            item_id = %id,
            has_image = record.image_url.is_some(),
            has_trailer = record.trailer_url.is_some(),
            provider = self.name(),
            "Metadata fetched"
        );

        Ok(record)
    }

    fn name(&self) -> &'static str {
        "myanimelist"
    }
}

/// Extracts the metadata fields from a detail page
///
/// The synopsis is the concatenated direct text of the description
/// paragraph, so inline markup such as `<br>` or the trailing source note
/// in `<i>` is left out.
pub fn parse_detail_page(detail_url: String, html: &str) -> AppResult<MetadataRecord> {
    let document = Html::parse_document(html);

    let synopsis = document
        .select(&selector(SYNOPSIS_SELECTOR)?)
        .flat_map(|p| direct_text(&p))
        .collect::<String>();

    let image_url = first_attr(&document, IMAGE_SELECTOR, "data-src")?;
    let trailer_url = first_attr(&document, TRAILER_SELECTOR, "href")?;

    Ok(MetadataRecord {
        detail_url,
        synopsis,
        image_url,
        trailer_url,
        fetched_at: Utc::now(),
    })
}

fn selector(css: &str) -> AppResult<Selector> {
    Selector::parse(css).map_err(|e| AppError::Internal(format!("bad selector '{}': {:?}", css, e)))
}

fn direct_text<'a>(element: &ElementRef<'a>) -> Vec<&'a str> {
    element
        .children()
        .filter_map(|child| child.value().as_text())
        .map(|text| &**text)
        .collect()
}

fn first_attr(document: &Html, css: &str, attr: &str) -> AppResult<Option<String>> {
    Ok(document
        .select(&selector(css)?)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing::{
        field::{Field, Visit},
        span::{Attributes, Id},
    };
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    const PAGE: &str = r#"<html><body>
        <div class="leftside">
          <img class="lazyload" data-src="https://cdn.myanimelist.net/images/anime/4/19644.jpg" itemprop="image" alt="Cowboy Bebop">
        </div>
        <div class="video-promotion">
          <a class="iframe js-fancybox-video video-unit promotion" href="https://www.youtube.com/embed/qig4KOK2R2g">Play</a>
        </div>
        <p itemprop="description">Crime is timeless.<br><br>In the year 2071, humanity has colonized the solar system.<br><br><i>[Written by MAL Rewrite]</i></p>
        </body></html>"#;

    #[test]
    fn test_parse_full_page() {
        let record = parse_detail_page("https://myanimelist.net/anime/1".to_string(), PAGE).unwrap();

        assert_eq!(record.detail_url, "https://myanimelist.net/anime/1");
        assert_eq!(
            record.synopsis,
            "Crime is timeless.In the year 2071, humanity has colonized the solar system."
        );
        assert_eq!(
            record.image_url.as_deref(),
            Some("https://cdn.myanimelist.net/images/anime/4/19644.jpg")
        );
        assert_eq!(
            record.trailer_url.as_deref(),
            Some("https://www.youtube.com/embed/qig4KOK2R2g")
        );
    }

    #[test]
    fn test_parse_missing_fields_are_absent() {
        let record = parse_detail_page(
            "https://myanimelist.net/anime/2".to_string(),
            "<html><body><p>nothing here</p></body></html>",
        )
        .unwrap();

        assert_eq!(record.synopsis, "");
        assert_eq!(record.image_url, None);
        assert_eq!(record.trailer_url, None);
    }

    #[test]
    fn test_trailer_requires_exact_class() {
        let html = r#"<a class="iframe js-fancybox-video video-unit promotion extra" href="x">Play</a>"#;
        let record = parse_detail_page("u".to_string(), html).unwrap();
        assert_eq!(record.trailer_url, None);
    }

    #[test]
    fn test_detail_url_template() {
        let resolver =
            MyAnimeListResolver::new("https://myanimelist.net/anime/{id}".to_string(), None).unwrap();
        assert_eq!(resolver.detail_url(ItemId(5114)), "https://myanimelist.net/anime/5114");
    }

    #[test]
    fn test_template_without_placeholder_rejected() {
        let result = MyAnimeListResolver::new("https://myanimelist.net/anime/".to_string(), None);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_fetch_parses_served_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/anime/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let resolver = MyAnimeListResolver::new(format!("{}/anime/{{id}}", server.uri()), None).unwrap();
        let record = resolver.fetch(ItemId(1)).await.unwrap();

        assert_eq!(record.detail_url, format!("{}/anime/1", server.uri()));
        assert!(record.synopsis.starts_with("Crime is timeless."));
        assert!(record.image_url.is_some());
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/anime/404"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let resolver = MyAnimeListResolver::new(format!("{}/anime/{{id}}", server.uri()), None).unwrap();
        let error = resolver.fetch(ItemId(404)).await.unwrap_err();

        assert!(matches!(error, AppError::Fetch(_)));
        assert!(error.is_fetch_error());
    }

    #[tokio::test]
    async fn test_fetch_transport_failure_is_fetch_error() {
        let resolver = MyAnimeListResolver::new(
            "http://127.0.0.1:1/anime/{id}".to_string(),
            Some(Duration::from_secs(2)),
        )
        .unwrap();

        let error = resolver.fetch(ItemId(1)).await.unwrap_err();
        assert!(error.is_fetch_error());
    }

    /// Records `name:provider` for every span opened while installed
    struct SpanLog(Arc<Mutex<Vec<String>>>);

    struct ProviderField(Option<String>);

    impl Visit for ProviderField {
        fn record_str(&mut self, field: &Field, value: &str) {
            if field.name() == "provider" {
                self.0 = Some(value.to_string());
            }
        }

        fn record_debug(&mut self, _field: &Field, _value: &dyn std::fmt::Debug) {}
    }

    impl<S: tracing::Subscriber> Layer<S> for SpanLog {
        fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
            let mut provider = ProviderField(None);
            attrs.record(&mut provider);
            self.0.lock().unwrap().push(format!(
                "{}:{}",
                attrs.metadata().name(),
                provider.0.unwrap_or_default()
            ));
        }
    }

    #[tokio::test]
    async fn test_fetch_runs_in_provider_span() {
        let spans = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(SpanLog(Arc::clone(&spans)));
        let _guard = tracing::subscriber::set_default(subscriber);

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/anime/7"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let resolver = MyAnimeListResolver::new(format!("{}/anime/{{id}}", server.uri()), None).unwrap();
        resolver.fetch(ItemId(7)).await.unwrap();

        assert!(spans
            .lock()
            .unwrap()
            .iter()
            .any(|span| span == "fetch:myanimelist"));
    }
}
