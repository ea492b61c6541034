use std::collections::BTreeSet;

use libreg_resolve::auth_document::{AuthDocumentParser, JsonAuthDocumentParser, ParseResult};
use libreg_resolve::{HttpClient, ReqwestHttpClient};
use serde::Serialize;
use url::Url;

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::{HttpArgs, OutputArgs};

#[derive(Serialize)]
struct CheckResult {
    valid: bool,
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    authentication: Vec<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    features: BTreeSet<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

pub async fn check_auth_doc_cmd(
    target: &str,
    warnings_as_errors: bool,
    output: OutputArgs,
    http: HttpArgs,
) -> i32 {
    let (uri, bytes) = match load(target, &http).await {
        Ok(v) => v,
        Err(e) => {
            print_error(output.format, output.quiet, &e);
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let parsed = JsonAuthDocumentParser.parse(&uri, &bytes);
    let warnings: Vec<String> = parsed.warnings().iter().map(ToString::to_string).collect();
    let result = match parsed {
        ParseResult::Success { document, .. } => CheckResult {
            valid: !(warnings_as_errors && !warnings.is_empty()),
            source: uri.to_string(),
            id: Some(document.id.to_string()),
            title: Some(document.title),
            authentication: document
                .authentication
                .iter()
                .map(|a| a.type_uri.clone())
                .collect(),
            features: document.features.enabled,
            warnings,
            errors: vec![],
        },
        ParseResult::Failure { errors, .. } => CheckResult {
            valid: false,
            source: uri.to_string(),
            id: None,
            title: None,
            authentication: vec![],
            features: BTreeSet::new(),
            warnings,
            errors: errors.iter().map(ToString::to_string).collect(),
        },
    };

    if output.format == OutputFormat::Text && !output.quiet {
        match (&result.title, result.valid) {
            (Some(title), true) => println!("ok: {title} ({})", result.source),
            _ => eprintln!("error: authentication document is not usable"),
        }
        for a in &result.authentication {
            println!("  authentication: {a}");
        }
        for f in &result.features {
            println!("  feature: {f}");
        }
        for w in &result.warnings {
            eprintln!("warning: {w}");
        }
        for e in &result.errors {
            eprintln!("- {e}");
        }
    } else {
        print_result(output.format, output.quiet, &result);
    }

    if result.valid {
        exit_codes::SUCCESS
    } else {
        exit_codes::VALIDATION_FAILED
    }
}

async fn load(target: &str, http: &HttpArgs) -> Result<(Url, Vec<u8>), String> {
    if target.starts_with("http://") || target.starts_with("https://") {
        let uri = Url::parse(target).map_err(|e| format!("invalid URL {target:?}: {e}"))?;
        let client = ReqwestHttpClient::new(http.to_config())
            .map_err(|e| format!("failed to create HTTP client: {e}"))?;
        let response = client
            .get(&uri)
            .await
            .map_err(|e| format!("failed to fetch {uri}: {e}"))?;
        return Ok((uri, response.body));
    }

    let path = tokio::fs::canonicalize(target)
        .await
        .map_err(|e| format!("failed to read {target}: {e}"))?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let uri = Url::from_file_path(&path)
        .map_err(|()| format!("cannot express {} as a URL", path.display()))?;
    Ok((uri, bytes))
}
