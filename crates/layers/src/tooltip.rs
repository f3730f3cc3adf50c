use scene::RegionSet;

#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub region: usize,
    pub name: String,
    pub value: f64,
    pub html: String,
}

/// Hover text for `region_index` under the selected scenario.
pub fn region_tooltip(
    set: &RegionSet,
    region_index: usize,
    scenario_index: Option<usize>,
) -> Option<Tooltip> {
    let region = set.region(region_index)?;
    let value = scenario_index
        .and_then(|i| region.value(i))
        .unwrap_or(0.0);
    let html = format!(
        "<div><b>Zone Totals</b></div>\n<div>Zone: {}</div>\n<div>Demand: {}</div>",
        escape_html(&region.name),
        format_number(value)
    );
    Some(Tooltip {
        region: region_index,
        name: region.name.clone(),
        value,
        html,
    })
}

/// Number text as a browser would print it: plain decimals between 1e-6 and
/// 1e21, exponent form with an explicit sign outside that.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return value.to_string();
    }
    let text = format!("{value:e}");
    match text.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => text,
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{format_number, region_tooltip};
    use scene::{GeoPoint, Polygon, Region, RegionSet, ScenarioList};

    fn set() -> RegionSet {
        let poly = Polygon::new(vec![vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(1.0, 0.0),
            GeoPoint::new(0.0, 1.0),
        ]]);
        RegionSet::new(
            ScenarioList::new(["Core", "High"]),
            vec![Region::new("Leeds <001>", vec![poly], vec![12.5, 40.0])],
        )
        .unwrap()
    }

    #[test]
    fn shows_zone_and_selected_demand() {
        let tip = region_tooltip(&set(), 0, Some(0)).unwrap();
        assert_eq!(
            tip.html,
            "<div><b>Zone Totals</b></div>\n<div>Zone: Leeds &lt;001&gt;</div>\n<div>Demand: 12.5</div>"
        );
        assert_eq!(region_tooltip(&set(), 0, Some(1)).unwrap().value, 40.0);
    }

    #[test]
    fn integral_values_print_without_fraction() {
        assert!(region_tooltip(&set(), 0, Some(1)).unwrap().html.ends_with("Demand: 40</div>"));
    }

    #[test]
    fn extreme_values_use_exponent_form() {
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(-2.5e22), "-2.5e+22");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(123456.75), "123456.75");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
    }

    #[test]
    fn unknown_region_has_no_tooltip() {
        assert!(region_tooltip(&set(), 3, Some(0)).is_none());
    }
}
