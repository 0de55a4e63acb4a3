//! Parsing of the quiz-bearing routes a visitor can land on.

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use url::{Url, form_urlencoded};

use crate::error::{CoreError, Result};
use crate::QuizType;

/// Query parameters recognised on quiz-bearing routes.
///
/// Empty values are treated exactly like missing ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub doctor: Option<String>,
    #[serde(default, rename = "type")]
    pub quiz_type: Option<String>,
}

impl QueryParams {
    /// Parse a raw query string (with or without the leading `?`).
    /// The first occurrence of a repeated parameter wins.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let mut params = Self::default();
        for (name, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let slot = match name.as_ref() {
                "key" => &mut params.key,
                "doctor" => &mut params.doctor,
                "type" => &mut params.quiz_type,
                _ => continue,
            };
            if slot.is_none() && !value.is_empty() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }

    #[must_use]
    pub fn key(&self) -> Option<&str> {
        non_empty(self.key.as_deref())
    }

    #[must_use]
    pub fn doctor(&self) -> Option<&str> {
        non_empty(self.doctor.as_deref())
    }

    #[must_use]
    pub fn explicit_type(&self) -> Option<&str> {
        non_empty(self.quiz_type.as_deref())
    }

    /// Whether the visit carries a direct assessment link signal (key or doctor).
    #[must_use]
    pub fn has_link_signal(&self) -> bool {
        self.key().is_some() || self.doctor().is_some()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A quiz-bearing route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
    /// `/assessment/{quiz}`: informational entry page of one quiz.
    Entry { quiz_type: QuizType },
    /// `/quiz`: the quiz runner.
    Quiz,
    /// `/s/{code}`: short link awaiting resolution.
    ShortLink { code: String },
    /// `/share/{quiz}/{doctor}`: resolved doctor share page.
    Share { quiz_type: QuizType, doctor_id: String },
}

/// A route together with its query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub route: Route,
    pub params: QueryParams,
}

impl RouteRequest {
    #[must_use]
    pub const fn new(route: Route, params: QueryParams) -> Self {
        Self { route, params }
    }

    /// Parse an absolute URL or a path with optional query string.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidRoute`] for paths that are not quiz-bearing and
    /// [`CoreError::UnknownQuizType`] when a path segment names an unknown quiz.
    pub fn parse(input: &str) -> Result<Self> {
        let url = parse_url(input)?;
        let params = QueryParams::parse(url.query().unwrap_or_default());
        let segments: Vec<String> = url
            .path_segments()
            .map(|segs| {
                segs.filter(|s| !s.is_empty())
                    .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();

        let route = match segments.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
            ["quiz"] => Route::Quiz,
            ["assessment", quiz] => Route::Entry { quiz_type: quiz.parse()? },
            ["s", code] => Route::ShortLink { code: (*code).to_owned() },
            ["share", quiz, doctor] => {
                Route::Share { quiz_type: quiz.parse()?, doctor_id: (*doctor).to_owned() }
            },
            _ => return Err(CoreError::InvalidRoute(url.path().to_owned())),
        };
        Ok(Self { route, params })
    }
}

fn parse_url(input: &str) -> Result<Url> {
    match Url::parse(input) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse("http://localhost/")
            .and_then(|base| base.join(input))
            .map_err(|e| CoreError::InvalidRoute(format!("{input}: {e}"))),
        Err(e) => Err(CoreError::InvalidRoute(format!("{input}: {e}"))),
    }
}
