use crate::config::ROOT_DOMAIN;
use crate::environment::{Environment, Product};
use crate::error::HarnessError;

// --- Route tables ---
//
// One entry per deep link, keyed by the route name used across the suite.
// Paths containing `{id}` take a resource identifier at resolution time.

type RouteTable = &'static [(&'static str, &'static str)];

const DATA_ROUTES: RouteTable = &[
    ("home", ""),
    ("networks", "/networks"),
    ("devices", "/devices"),
    ("collectors", "/collectors"),
    ("datasources", "/datasources"),
    ("dataCollectorGroups", "/dataCollectorGroups"),
    ("deviceGroups", "/deviceGroups"),
    ("networkById", "/networks/{id}"),
    ("deviceById", "/devices/{id}"),
    ("deviceProperties", "/devices/{id}/properties"),
    ("deviceAlerts", "/devices/{id}/alerts"),
    ("collectorById", "/collectors/{id}"),
    ("settings", "/settings"),
    ("apiTokens", "/settings/tokens"),
];

const REPORT_ROUTES: RouteTable = &[
    ("home", ""),
    ("studio", "/studio"),
    ("studioNew", "/studio/new"),
    ("studioById", "/studio/{id}"),
    ("reports", "/reports"),
    ("reportById", "/reports/{id}"),
    ("reportEdit", "/reports/{id}/edit"),
    ("reportRun", "/reports/{id}/run"),
    ("schedules", "/schedules"),
    ("scheduleNew", "/schedules/new"),
    ("scheduleById", "/schedules/{id}"),
    ("scheduleEdit", "/schedules/{id}/edit"),
    ("history", "/history"),
    ("outputs", "/outputs"),
    ("templates", "/templates"),
    ("macros", "/macros"),
    ("settings", "/settings"),
    ("connections", "/settings/connections"),
];

const ALERT_ROUTES: RouteTable = &[
    ("home", ""),
    ("alerts", "/alerts"),
    ("incidents", "/incidents"),
    ("incidentById", "/incidents/{id}"),
    ("rules", "/rules"),
    ("ruleNew", "/rules/new"),
    ("ruleById", "/rules/{id}"),
    ("ruleEdit", "/rules/{id}/edit"),
    ("channels", "/channels"),
    ("channelNew", "/channels/new"),
    ("channelById", "/channels/{id}"),
    ("escalations", "/escalations"),
    ("escalationNew", "/escalations/new"),
    ("escalationById", "/escalations/{id}"),
    ("settings", "/settings"),
];

const ADMIN_ROUTES: RouteTable = &[
    ("home", ""),
    ("tenants", "/tenants"),
    ("tenantNew", "/tenants/new"),
    ("tenantById", "/tenants/{id}"),
    ("tenantEdit", "/tenants/{id}/edit"),
    ("users", "/users"),
    ("userNew", "/users/new"),
    ("userById", "/users/{id}"),
    ("userEdit", "/users/{id}/edit"),
    ("roles", "/roles"),
    ("roleNew", "/roles/new"),
    ("roleById", "/roles/{id}"),
    ("permissions", "/permissions"),
    ("apiTokens", "/api-tokens"),
    ("auditLogs", "/audit"),
    ("settings", "/settings"),
    ("systemHealth", "/system/health"),
];

const CONNECT_ROUTES: RouteTable = &[
    ("home", ""),
    ("connectors", "/connectors"),
    ("connectorNew", "/connectors/new"),
    ("connectorById", "/connectors/{id}"),
    ("integrations", "/integrations"),
    ("integrationNew", "/integrations/new"),
    ("integrationById", "/integrations/{id}"),
    ("webhooks", "/webhooks"),
    ("webhookNew", "/webhooks/new"),
    ("webhookById", "/webhooks/{id}"),
    ("settings", "/settings"),
];

const DOCS_ROUTES: RouteTable = &[
    ("home", ""),
    ("datamagic", "/datamagic"),
    ("reportmagic", "/reportmagic"),
    ("alertmagic", "/alertmagic"),
    ("reportMagicMacros", "/reportmagic/macros"),
    ("reportMagicFunctions", "/reportmagic/functions"),
    ("reportMagicExamples", "/reportmagic/examples"),
    ("api", "/api"),
    ("apiReference", "/api/reference"),
    ("gettingStarted", "/getting-started"),
    ("tutorials", "/tutorials"),
    ("releaseNotes", "/release-notes"),
    ("changelog", "/changelog"),
];

const WWW_ROUTES: RouteTable = &[
    ("home", ""),
    ("dashboard", "/dashboard"),
    ("profile", "/profile"),
    ("profileEdit", "/profile/edit"),
    ("profileSettings", "/profile/settings"),
    ("profileTokens", "/profile/tokens"),
    ("account", "/account"),
    ("billing", "/account/billing"),
    ("subscription", "/account/subscription"),
    ("products", "/products"),
    ("feedback", "/feedback"),
    ("support", "/support"),
    ("contactUs", "/contact"),
];

fn routes_for(product: Product) -> Option<RouteTable> {
    match product {
        Product::Www => Some(WWW_ROUTES),
        Product::Data => Some(DATA_ROUTES),
        Product::Alert => Some(ALERT_ROUTES),
        Product::Report => Some(REPORT_ROUTES),
        Product::Docs => Some(DOCS_ROUTES),
        Product::Admin => Some(ADMIN_ROUTES),
        Product::Connect => Some(CONNECT_ROUTES),
        // Resolved per-route; see resolve_special.
        Product::Special => None,
    }
}

// --- Base URL resolution ---

/// NCalc 101 has no environment variations; it always lives here.
pub const NCALC101_URL: &str = "https://ncalc101.magicsuite.net";

const SUBDOMAIN_PRODUCTS: &[Product] = &[
    Product::Www,
    Product::Data,
    Product::Alert,
    Product::Report,
    Product::Docs,
    Product::Admin,
    Product::Connect,
];

/// Handcrafted per-product base URLs for environments with non-uniform
/// naming. Checked before the uniform template; a single source of truth
/// for the literals that used to drift between files.
const SPECIAL_ENV_BASES: &[(Environment, &[(Product, &str)])] = &[
    (
        Environment::Alpha2,
        &[
            (Product::Www, "https://www.alpha2.magicsuite.net"),
            (Product::Data, "https://data.alpha2.magicsuite.net"),
            (Product::Alert, "https://alert.alpha2.magicsuite.net"),
            (Product::Report, "https://report.alpha2.magicsuite.net"),
            (Product::Docs, "https://docs.alpha2.magicsuite.net"),
            (Product::Admin, "https://admin.alpha2.magicsuite.net"),
            (Product::Connect, "https://connect.alpha2.magicsuite.net"),
        ],
    ),
    (
        Environment::Alpha3,
        &[
            (Product::Www, "https://www.alpha3.magicsuite.net"),
            (Product::Data, "https://data.alpha3.magicsuite.net"),
            (Product::Alert, "https://alert.alpha3.magicsuite.net"),
            (Product::Report, "https://report.alpha3.magicsuite.net"),
            (Product::Docs, "https://docs.alpha3.magicsuite.net"),
            (Product::Admin, "https://admin.alpha3.magicsuite.net"),
            (Product::Connect, "https://connect.alpha3.magicsuite.net"),
        ],
    ),
    (
        Environment::Test2,
        &[
            (Product::Www, "https://www.test2.magicsuite.net"),
            (Product::Data, "https://data.test2.magicsuite.net"),
            (Product::Alert, "https://alert.test2.magicsuite.net"),
            (Product::Report, "https://report.test2.magicsuite.net"),
            (Product::Docs, "https://docs.test2.magicsuite.net"),
            (Product::Admin, "https://admin.test2.magicsuite.net"),
            (Product::Connect, "https://connect.test2.magicsuite.net"),
        ],
    ),
    (
        Environment::Ps,
        &[
            (Product::Www, "https://www.ps.magicsuite.net"),
            (Product::Data, "https://data.ps.magicsuite.net"),
            (Product::Alert, "https://alert.ps.magicsuite.net"),
            (Product::Report, "https://report.ps.magicsuite.net"),
            (Product::Docs, "https://docs.ps.magicsuite.net"),
            (Product::Admin, "https://admin.ps.magicsuite.net"),
            (Product::Connect, "https://connect.ps.magicsuite.net"),
        ],
    ),
    (
        Environment::Production,
        &[
            (Product::Www, "https://www.magicsuite.net"),
            (Product::Data, "https://data.magicsuite.net"),
            (Product::Alert, "https://alert.magicsuite.net"),
            (Product::Report, "https://report.magicsuite.net"),
            (Product::Docs, "https://docs.magicsuite.net"),
            (Product::Admin, "https://admin.magicsuite.net"),
            (Product::Connect, "https://connect.magicsuite.net"),
        ],
    ),
];

/// Base URL for a subdomain product. Precedence: the override table for the
/// special-cased environments, then `https://{product}.{env}.{root}`, with
/// production omitting the environment segment.
pub fn app_base_url(product: Product, env: Environment) -> String {
    if product == Product::Special {
        // Environment-invariant by design, not a bug.
        return NCALC101_URL.to_string();
    }

    if let Some((_, overrides)) = SPECIAL_ENV_BASES.iter().find(|(e, _)| *e == env) {
        if let Some((_, base)) = overrides.iter().find(|(p, _)| *p == product) {
            return (*base).to_string();
        }
    }

    if env.is_production() {
        return format!("https://{}.{}", product, ROOT_DOMAIN);
    }

    format!("https://{}.{}.{}", product, env, ROOT_DOMAIN)
}

// --- Resolution ---

/// Translate (product, route, environment, optional id) into a fully
/// qualified URL. Pure and deterministic; unknown products or routes fail
/// fast, never an empty string.
pub fn resolve(
    product: Product,
    route: &str,
    env: Environment,
    id: Option<&str>,
) -> Result<String, HarnessError> {
    if product == Product::Special {
        return resolve_special(route, env);
    }

    let table = routes_for(product).ok_or_else(|| HarnessError::UnknownProduct(product.to_string()))?;

    let path = table
        .iter()
        .find(|(name, _)| *name == route)
        .map(|(_, path)| *path)
        .ok_or_else(|| HarnessError::UnknownRoute {
            product: product.to_string(),
            route: route.to_string(),
        })?;

    let path = if path.contains("{id}") {
        let id = id.ok_or_else(|| HarnessError::MissingId {
            product: product.to_string(),
            route: route.to_string(),
        })?;
        path.replace("{id}", id)
    } else {
        path.to_string()
    };

    Ok(format!("{}{}", app_base_url(product, env), path))
}

fn resolve_special(route: &str, env: Environment) -> Result<String, HarnessError> {
    match route {
        // NCalc 101 ignores the environment argument entirely.
        "ncalc101" => Ok(NCALC101_URL.to_string()),
        "api" => {
            if env.is_production() {
                Ok(format!("https://api.{}", ROOT_DOMAIN))
            } else {
                Ok(format!("https://api.{}.{}", env, ROOT_DOMAIN))
            }
        }
        other => Err(HarnessError::UnknownRoute {
            product: Product::Special.to_string(),
            route: other.to_string(),
        }),
    }
}

/// Login target for session capture: the www portal, except on test2 where
/// the suite signs in through NCalc 101 as the common entry app.
pub fn login_url(env: Environment) -> String {
    if env == Environment::Test2 {
        return format!("https://ncalc101.{}.{}", env, ROOT_DOMAIN);
    }
    app_base_url(Product::Www, env)
}

// --- Curated enumeration ---

/// Fixed smoke subset swept for reachability regressions. Deliberately not
/// the full route table: list pages and homes only, nothing id-shaped.
const CURATED: &[(&str, Product, &str)] = &[
    ("data_home", Product::Data, "home"),
    ("data_networks", Product::Data, "networks"),
    ("data_devices", Product::Data, "devices"),
    ("data_collectors", Product::Data, "collectors"),
    ("data_datasources", Product::Data, "datasources"),
    ("data_settings", Product::Data, "settings"),
    ("report_home", Product::Report, "home"),
    ("report_studio", Product::Report, "studio"),
    ("report_reports", Product::Report, "reports"),
    ("report_schedules", Product::Report, "schedules"),
    ("report_history", Product::Report, "history"),
    ("alert_home", Product::Alert, "home"),
    ("alert_alerts", Product::Alert, "alerts"),
    ("alert_incidents", Product::Alert, "incidents"),
    ("alert_rules", Product::Alert, "rules"),
    ("alert_channels", Product::Alert, "channels"),
    ("admin_home", Product::Admin, "home"),
    ("admin_tenants", Product::Admin, "tenants"),
    ("admin_users", Product::Admin, "users"),
    ("admin_roles", Product::Admin, "roles"),
    ("connect_home", Product::Connect, "home"),
    ("connect_connectors", Product::Connect, "connectors"),
    ("connect_integrations", Product::Connect, "integrations"),
    ("docs_home", Product::Docs, "home"),
    ("docs_api", Product::Docs, "api"),
    ("docs_reportmagic_macros", Product::Docs, "reportMagicMacros"),
    ("www_home", Product::Www, "home"),
    ("www_dashboard", Product::Www, "dashboard"),
    ("www_profile", Product::Www, "profile"),
];

/// Flat (key, url) mapping of the curated subset for one environment,
/// in a stable order. Every entry resolves; the table holds no id routes.
pub fn curated_urls(env: Environment) -> Vec<(String, String)> {
    CURATED
        .iter()
        .map(|(key, product, route)| {
            let url = resolve(*product, route, env, None)
                .expect("curated table only names known id-less routes");
            (key.to_string(), url)
        })
        .collect()
}
