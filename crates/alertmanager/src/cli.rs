pub struct Args {
    pub port: u16,
    pub alertmanager_conf: String,
    pub alertmanager_url: String,
    pub multitenant_label: String,
    pub template_dir: String,
    pub delete_route_with_receiver: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            port: 9101,
            alertmanager_conf: "./alertmanager.yml".into(),
            alertmanager_url: "alertmanager:9093".into(),
            multitenant_label: String::new(),
            template_dir: "./templates/".into(),
            delete_route_with_receiver: false,
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
            "port" | "alertmanager-conf" | "alertmanagerURL" | "multitenant-label"
            | "template-directory" => {
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
                    "alertmanager-conf" => parsed.alertmanager_conf = value,
                    "alertmanagerURL" => parsed.alertmanager_url = value,
                    "multitenant-label" => parsed.multitenant_label = value,
                    _ => parsed.template_dir = value,
                }
            }
            "delete-route-with-receiver" => parsed.delete_route_with_receiver = true,
            "help" | "h" => {
                println!("Usage: promcfg_alertmanager [OPTIONS]\n");
                println!("Options:");
                println!("  -port <PORT>                  Port to listen for requests (default 9101)");
                println!("  -alertmanager-conf <PATH>     Path to the alertmanager configuration file");
                println!("  -alertmanagerURL <HOST:PORT>  Alertmanager instance being managed");
                println!("  -multitenant-label <LABEL>    Label for route matching; empty = single tenant");
                println!("  -template-directory <DIR>     Directory where template files are stored");
                println!("  -delete-route-with-receiver   Also prune route references when deleting a receiver");
                std::process::exit(0);
            }
            "version" | "V" => {
                println!("promcfg_alertmanager {}", env!("CARGO_PKG_VERSION"));
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
