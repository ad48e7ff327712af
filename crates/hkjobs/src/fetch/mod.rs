use std::cell::OnceCell;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions, Tab};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use tracing::debug;

use crate::error::FetchError;

/// Network settings shared by all adapters. One `Fetcher` is created per
/// institution thread; the headless browser is only launched when a rendered
/// fetch is actually requested.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub attempts: u32,
    pub backoff: Duration,
    /// Pause between successive page fetches against the same site.
    pub polite_delay: Duration,
    pub user_agent: String,
    pub accept_language: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            attempts: 3,
            backoff: Duration::from_secs(2),
            polite_delay: Duration::from_millis(500),
            user_agent: concat!(
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) ",
                "AppleWebKit/537.36 (KHTML, like Gecko) ",
                "Chrome/120.0.0.0 Safari/537.36"
            )
            .to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

pub struct Fetcher {
    config: FetchConfig,
    client: Client,
    browser: OnceCell<Browser>,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&config.accept_language) {
            headers.insert(ACCEPT_LANGUAGE, value);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            config,
            client,
            browser: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Called by adapters between listing pages of the same site.
    pub fn pause(&self) {
        thread::sleep(self.config.polite_delay);
    }

    /// GET a static page, retrying with doubling backoff.
    pub fn get(&self, url: &str) -> Result<String, FetchError> {
        self.with_retries(url, |attempt| {
            debug!(url, attempt, "fetching page");
            self.client.get(url).send()?.error_for_status()?.text()
        })
    }

    /// GET a JSON endpoint with query parameters and extra request headers.
    pub fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<serde_json::Value, FetchError> {
        let text = self.with_retries(url, |attempt| {
            debug!(url, attempt, "fetching json");
            let mut request = self.client.get(url).query(query);
            for (name, value) in headers {
                request = request.header(*name, *value);
            }
            request.send()?.error_for_status()?.text()
        })?;
        Self::decode_json(url, &text)
    }

    /// Decode failures are not retried; the error names the offending URL.
    fn decode_json(url: &str, text: &str) -> Result<serde_json::Value, FetchError> {
        serde_json::from_str(text).map_err(|source| FetchError::Json {
            url: url.to_string(),
            source,
        })
    }

    fn with_retries<T>(
        &self,
        url: &str,
        mut attempt_fn: impl FnMut(u32) -> Result<T, reqwest::Error>,
    ) -> Result<T, FetchError> {
        let mut delay = self.config.backoff;
        let mut last_error = None;

        for attempt in 1..=self.config.attempts {
            match attempt_fn(attempt) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    debug!(url, attempt, error = %e, "request attempt failed");
                    last_error = Some(e);
                }
            }
            if attempt < self.config.attempts {
                thread::sleep(delay);
                delay *= 2;
            }
        }

        Err(FetchError::Http {
            url: url.to_string(),
            attempts: self.config.attempts,
            source: last_error.expect("at least one attempt was made"),
        })
    }

    /// Open a JS-rendered page in the headless browser. `wait_css` gives the
    /// listing a chance to hydrate; a missing selector is not an error, the
    /// adapter's parser decides what to do with whatever rendered.
    pub fn rendered(&self, url: &str, wait_css: Option<&str>) -> Result<RenderedPage, FetchError> {
        let browser = self.browser()?;
        let rendered_err = |e: String| FetchError::Rendered {
            url: url.to_string(),
            message: e,
        };

        let tab = browser.new_tab().map_err(|e| rendered_err(e.to_string()))?;
        tab.set_default_timeout(Duration::from_secs(30));
        let _ = tab.set_user_agent(
            &self.config.user_agent,
            Some(&self.config.accept_language),
            None,
        );
        tab.navigate_to(url)
            .map_err(|e| rendered_err(e.to_string()))?;
        tab.wait_until_navigated()
            .map_err(|e| rendered_err(e.to_string()))?;

        if let Some(css) = wait_css {
            let _ = tab.wait_for_element_with_custom_timeout(css, Duration::from_secs(8));
        }

        Ok(RenderedPage {
            tab,
            url: url.to_string(),
        })
    }

    fn browser(&self) -> Result<&Browser, FetchError> {
        if self.browser.get().is_none() {
            let options = LaunchOptions::default_builder()
                .headless(true)
                .build()
                .map_err(|e| FetchError::BrowserLaunch(e.to_string()))?;
            let browser =
                Browser::new(options).map_err(|e| FetchError::BrowserLaunch(e.to_string()))?;
            let _ = self.browser.set(browser);
        }
        Ok(self.browser.get().expect("browser set above"))
    }
}

/// A live tab on a JS-rendered listing page. Pagination on these sites is
/// click-driven, so the page stays open while the adapter walks it.
pub struct RenderedPage {
    tab: Arc<Tab>,
    url: String,
}

impl RenderedPage {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current DOM serialized back to HTML.
    pub fn html(&self) -> Result<String, FetchError> {
        self.tab.get_content().map_err(|e| FetchError::Rendered {
            url: self.url.clone(),
            message: e.to_string(),
        })
    }

    /// Visible text of the page body.
    pub fn body_text(&self) -> Result<String, FetchError> {
        self.tab
            .find_element("body")
            .and_then(|body| body.get_inner_text())
            .map_err(|e| FetchError::Rendered {
                url: self.url.clone(),
                message: e.to_string(),
            })
    }

    /// Click the first element matching the selector. Returns false when the
    /// element is missing or the click fails; pagination loops treat that as
    /// "no more pages".
    pub fn click(&self, css: &str) -> bool {
        match self.tab.find_element(css) {
            Ok(element) => element.click().is_ok(),
            Err(_) => false,
        }
    }

    pub fn click_xpath(&self, xpath: &str) -> bool {
        match self.tab.find_element_by_xpath(xpath) {
            Ok(element) => element.click().is_ok(),
            Err(_) => false,
        }
    }

    /// Give the page time to load more content after a click.
    pub fn settle(&self, millis: u64) {
        thread::sleep(Duration::from_millis(millis));
    }
}
