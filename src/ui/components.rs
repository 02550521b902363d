/// Reusable UI components
use patternfly_yew::prelude::*;
use yew::prelude::*;

use crate::rules::{GroupColor, RuleRecord};

fn swatch(color: GroupColor) -> &'static str {
    match color {
        GroupColor::Grey => "#5f6368",
        GroupColor::Blue => "#1a73e8",
        GroupColor::Red => "#d93025",
        GroupColor::Yellow => "#f9ab00",
        GroupColor::Green => "#188038",
        GroupColor::Pink => "#d01884",
        GroupColor::Purple => "#a142f4",
        GroupColor::Cyan => "#007b83",
        GroupColor::Orange => "#fa903e",
    }
}

/// Learned patterns are escaped hostnames; show them as typed
pub fn display_pattern(source: &str) -> String {
    source.replace("\\.", ".")
}

#[derive(Properties, PartialEq)]
pub struct ColorBadgeProps {
    pub color: GroupColor,
}

#[function_component(ColorBadge)]
pub fn color_badge(props: &ColorBadgeProps) -> Html {
    html! {
        <span
            class="color-badge"
            style={format!("background-color: {}; color: white; border-radius: 8px; padding: 2px 8px; font-size: 12px;", swatch(props.color))}
        >
            {props.color.as_str()}
        </span>
    }
}

#[derive(Properties, PartialEq)]
pub struct RuleCardProps {
    pub record: RuleRecord,
    pub on_delete: Callback<String>,
    #[prop_or(false)]
    pub disabled: bool,
}

#[function_component(RuleCard)]
pub fn rule_card(props: &RuleCardProps) -> Html {
    let record = &props.record;
    let on_delete = props.on_delete.reform({
        let name = record.name.clone();
        move |_: MouseEvent| name.clone()
    });

    html! {
        <div class="rule-card">
            <div class="rule-header">
                <h3 class="rule-title">{&record.name}</h3>
                <ColorBadge color={record.color} />
                <Button onclick={on_delete} disabled={props.disabled} variant={ButtonVariant::Danger}>
                    {"Delete"}
                </Button>
            </div>
            if record.patterns.is_empty() {
                <p class="empty-state-hint">{"No sites yet."}</p>
            } else {
                <ul class="rule-patterns">
                    {for record.patterns.iter().map(|source| html! {
                        <li class="rule-pattern">{display_pattern(source)}</li>
                    })}
                </ul>
            }
        </div>
    }
}
