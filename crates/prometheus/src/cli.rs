pub struct Args {
    pub port: u16,
    pub rules_dir: String,
    pub prometheus_url: String,
    pub multitenant_label: String,
    pub restrict_queries: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            port: 9100,
            rules_dir: ".".into(),
            prometheus_url: "prometheus:9090".into(),
            multitenant_label: "tenant".into(),
            restrict_queries: false,
        }
    }
}

pub fn parse() -> Args {
    parse_from(std::env::args().skip(1))
}

fn parse_from(args: impl Iterator<Item = String>) -> Args {
    let mut parsed = Args::default();
    let mut args = args;

    while let Some(arg) = args.next() {
        let trimmed = arg.trim_start_matches('-');
        let (flag, inline_value) = match trimmed.split_once('=') {
            Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
            None => (trimmed.to_string(), None),
        };
        match flag.as_str() {
            "port" | "rules-dir" | "prometheusURL" | "multitenant-label" => {
                let value = inline_value.or_else(|| args.next()).unwrap_or_else(|| {
                    eprintln!("error: -{flag} requires a value");
                    std::process::exit(1);
                });
                match flag.as_str() {
                    "port" => {
                        parsed.port = value.parse().unwrap_or_else(|_| {
                            eprintln!("error: invalid port '{value}'");
                            std::process::exit(1);
                        })
                    }
                    "rules-dir" => parsed.rules_dir = value,
                    "prometheusURL" => parsed.prometheus_url = value,
                    _ => parsed.multitenant_label = value,
                }
            }
            "restrict-queries" => parsed.restrict_queries = true,
            "help" | "h" => {
                println!("Usage: promcfg_prometheus [OPTIONS]\n");
                println!("Options:");
                println!("  -port <PORT>                Port to listen for requests (default 9100)");
                println!("  -rules-dir <DIR>            Directory to write rules files (default '.')");
                println!("  -prometheusURL <HOST:PORT>  Prometheus instance reading these rules");
                println!("  -multitenant-label <LABEL>  Label segmenting alerting rules per tenant");
                println!("  -restrict-queries           Restrict rule expressions to the tenant's series");
                std::process::exit(0);
            }
            "version" | "V" => {
                println!("promcfg_prometheus {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            other => {
                eprintln!("error: unknown argument '{other}'");
                std::process::exit(1);
            }
        }
    }
    parsed
}
