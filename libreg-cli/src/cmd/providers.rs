use libreg_resolve::ResolverConfig;
use serde::Serialize;

use crate::exit_codes;
use crate::output::{
    drain_events, print_error, print_events, print_provider_list, print_result,
    report_source_failures, OutputFormat, ProviderInfo,
};
use crate::setup::{build_registry, is_default_provider};
use crate::{HttpArgs, OutputArgs, SourceArgs};

#[derive(Serialize)]
struct ProvidersResult {
    providers: Vec<ProviderInfo>,
    failed_sources: usize,
}

pub async fn providers_cmd(
    events: bool,
    output: OutputArgs,
    source: SourceArgs,
    http: HttpArgs,
) -> i32 {
    let registry = match build_registry(&source, &http, ResolverConfig::default()) {
        Ok(r) => r,
        Err(e) => {
            print_error(output.format, output.quiet, &e);
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let mut rx = registry.subscribe();
    registry.refresh(source.include_testing).await;
    let seen = drain_events(&mut rx);
    if events {
        print_events(output.format, &seen);
    }
    let failed_sources = report_source_failures(output.format, output.quiet, &seen);
    if failed_sources >= source.loading_source_count() {
        print_error(output.format, output.quiet, "every provider source failed");
        return exit_codes::RUNTIME_ERROR;
    }

    let providers: Vec<ProviderInfo> = registry
        .descriptions_snapshot()
        .values()
        .filter(|d| !is_default_provider(&d.id))
        .map(ProviderInfo::from)
        .collect();
    let result = ProvidersResult {
        providers,
        failed_sources,
    };

    if output.format == OutputFormat::Text && !output.quiet {
        print_provider_list("Providers", &result.providers);
    } else {
        print_result(output.format, output.quiet, &result);
    }

    exit_codes::SUCCESS
}
