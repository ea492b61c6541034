use libreg_core::{AccountProvider, AccountProviderAuthentication, TaskResult};
use url::Url;

use crate::exit_codes;
use crate::output::{
    drain_events, print_error, print_events, print_result, report_source_failures, OutputFormat,
};
use crate::setup::build_registry;
use crate::{HttpArgs, OutputArgs, ResolverArgs, SourceArgs};

pub async fn resolve_cmd(
    id: &str,
    events: bool,
    output: OutputArgs,
    source: SourceArgs,
    http: HttpArgs,
    resolver: ResolverArgs,
) -> i32 {
    let id = match Url::parse(id) {
        Ok(u) => u,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("invalid provider id {id:?}: {e}"));
            return exit_codes::VALIDATION_FAILED;
        }
    };

    let registry = match build_registry(&source, &http, resolver.to_config()) {
        Ok(r) => r,
        Err(e) => {
            print_error(output.format, output.quiet, &e);
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let mut rx = registry.subscribe();
    registry.refresh(source.include_testing).await;
    let Some(description) = registry.find_description(&id) else {
        let seen = drain_events(&mut rx);
        if events {
            print_events(output.format, &seen);
        }
        report_source_failures(output.format, output.quiet, &seen);
        print_error(output.format, output.quiet, &format!("unknown provider {id}"));
        return exit_codes::RUNTIME_ERROR;
    };

    let show_progress = output.format == OutputFormat::Text && !output.quiet;
    let progress = move |_: &Url, message: &str| {
        if show_progress {
            eprintln!("... {message}");
        }
    };
    let result = registry.resolve(&progress, &description).await;

    let seen = drain_events(&mut rx);
    if events {
        print_events(output.format, &seen);
    }
    report_source_failures(output.format, output.quiet, &seen);

    if output.format == OutputFormat::Text && !output.quiet {
        print_text(&result);
    } else {
        print_result(output.format, output.quiet, &result);
    }

    if result.is_success() {
        exit_codes::SUCCESS
    } else {
        exit_codes::RESOLUTION_FAILED
    }
}

fn print_text(result: &TaskResult<AccountProvider>) {
    println!("Steps:");
    for step in result.steps() {
        match step.resolution.error_code() {
            None => println!("  [ok] {}: {}", step.description, step.message()),
            Some(code) => println!("  [{code}] {}: {}", step.description, step.message()),
        }
    }
    if !result.attributes().is_empty() {
        println!("Attributes:");
        for (name, value) in result.attributes() {
            println!("  {name}: {value}");
        }
    }

    let Some(provider) = result.result() else {
        println!("Resolution failed: {}", result.message());
        return;
    };
    println!("Provider {} <{}>", provider.display_name, provider.id);
    println!("  catalog: {}", provider.catalog_uri);
    println!("  authentication: {}", describe(&provider.authentication));
    for alternative in &provider.authentication_alternatives {
        println!("  alternative: {}", describe(alternative));
    }
    println!("  reservations: {}", provider.supports_reservations);
    println!("  main color: {}", provider.main_color);
    if let Some(email) = &provider.support_email {
        println!("  support: {email}");
    }
    if let Some(uri) = &provider.card_creator_uri {
        println!("  card creator: {uri}");
    }
}

fn describe(authentication: &AccountProviderAuthentication) -> String {
    match authentication {
        AccountProviderAuthentication::Basic(basic) => match &basic.description {
            Some(d) => format!("basic ({d})"),
            None => "basic".to_string(),
        },
        AccountProviderAuthentication::CoppaAgeGate { .. } => "COPPA age gate".to_string(),
        AccountProviderAuthentication::Anonymous => "anonymous".to_string(),
    }
}
