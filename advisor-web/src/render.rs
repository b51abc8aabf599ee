//! Server-side HTML for the dashboard page.

use advisor_core::chart::{escape, format_percent_precise};
use advisor_core::{DashboardRequest, DashboardView, Period, PlanOutcome, PortfolioPlan};
use std::fmt::Write;

const STYLE: &str = r#"
body { font-family: "Open Sans", verdana, arial, sans-serif; margin: 2rem; color: #222; }
form { display: flex; flex-wrap: wrap; gap: 1.5rem; align-items: flex-start; margin-bottom: 1rem; }
fieldset { border: none; padding: 0; margin: 0; }
fieldset label { margin-right: 0.75rem; }
select { min-width: 10rem; }
table { border-collapse: collapse; margin: 0.5rem 0 1rem; }
th, td { padding: 0.25rem 0.75rem; text-align: right; border-bottom: 1px solid #ddd; }
th:first-child, td:first-child { text-align: left; }
.error { color: #b00020; }
"#;

/// What to show under the form.
pub enum PageBody<'a> {
    View(&'a DashboardView),
    Error(&'a str),
}

/// Form state plus either the chart and plan or an error message.
pub fn render_page(
    title: &str,
    choices: &[String],
    request: &DashboardRequest,
    body: PageBody<'_>,
) -> String {
    let mut html = String::with_capacity(32 * 1024);
    let title = escape(title);
    let _ = writeln!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<h1>{title}</h1>"
    );

    render_form(&mut html, choices, request);

    match body {
        PageBody::View(view) => {
            let _ = writeln!(
                html,
                "<div id=\"stock-graph\">\n{}\n</div>",
                view.chart_svg
            );
            match &view.plan {
                Some(PlanOutcome::Ready(plan)) => render_plan(&mut html, plan),
                Some(PlanOutcome::Failed { message }) => {
                    let _ = writeln!(
                        html,
                        "<p id=\"portfolio-output\" class=\"error\">{}</p>",
                        escape(message)
                    );
                }
                None => {}
            }
        }
        PageBody::Error(message) => {
            let _ = writeln!(html, "<p class=\"error\">{}</p>", escape(message));
        }
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_form(html: &mut String, choices: &[String], request: &DashboardRequest) {
    html.push_str("<form method=\"get\" action=\"/\">\n<fieldset id=\"period\">\n");
    for period in Period::ALL {
        let checked = if period == request.period { " checked" } else { "" };
        let _ = writeln!(
            html,
            "<label><input type=\"radio\" name=\"period\" value=\"{p}\"{checked}> {p}</label>",
            p = period.as_str()
        );
    }
    html.push_str("</fieldset>\n");

    let amount = request
        .investment
        .map(|v| v.to_string())
        .unwrap_or_default();
    let _ = writeln!(
        html,
        "<label>Investment amount <input id=\"investment-amount\" type=\"number\" \
         name=\"investment\" min=\"0\" step=\"any\" value=\"{}\"></label>",
        escape(&amount)
    );

    // Tickers typed into the URL stay selectable alongside the configured choices
    let mut options: Vec<&str> = choices.iter().map(String::as_str).collect();
    for ticker in &request.tickers {
        if !options.contains(&ticker.as_str()) {
            options.push(ticker);
        }
    }
    let _ = writeln!(
        html,
        "<select id=\"stocks\" name=\"stocks\" multiple size=\"{}\">",
        options.len().max(2)
    );
    for option in options {
        let selected = if request.tickers.iter().any(|t| t == option) {
            " selected"
        } else {
            ""
        };
        let option = escape(option);
        let _ = writeln!(
            html,
            "<option value=\"{option}\"{selected}>{option}</option>"
        );
    }
    html.push_str("</select>\n<button type=\"submit\">Update</button>\n</form>\n");
}

fn render_plan(html: &mut String, plan: &PortfolioPlan) {
    html.push_str("<section id=\"portfolio-output\">\n<h2>Maximum Sharpe portfolio</h2>\n");

    html.push_str("<table class=\"weights\">\n<tr><th>Ticker</th><th>Weight</th></tr>\n");
    for w in &plan.weights {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td></tr>",
            escape(&w.ticker),
            format_percent_precise(w.weight)
        );
    }
    html.push_str("</table>\n");

    let perf = &plan.performance;
    let _ = writeln!(
        html,
        "<table class=\"performance\">\n\
         <tr><td>Expected annual return</td><td>{}</td></tr>\n\
         <tr><td>Annual volatility</td><td>{}</td></tr>\n\
         <tr><td>Sharpe ratio</td><td>{:.2}</td></tr>\n</table>",
        format_percent_precise(perf.expected_return),
        format_percent_precise(perf.volatility),
        perf.sharpe_ratio
    );

    html.push_str(
        "<table class=\"allocation\">\n\
         <tr><th>Ticker</th><th>Shares</th><th>Price</th><th>Cost</th></tr>\n",
    );
    for s in &plan.allocation.shares {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>${:.2}</td><td>${:.2}</td></tr>",
            escape(&s.ticker),
            s.shares,
            s.price,
            s.shares as f64 * s.price
        );
    }
    html.push_str("</table>\n");

    let _ = writeln!(
        html,
        "<p>Invested ${:.2} of ${:.2}. Funds remaining: ${:.2}</p>\n</section>",
        plan.allocation.invested(),
        plan.investment,
        plan.allocation.leftover
    );
}
