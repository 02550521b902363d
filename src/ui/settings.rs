/// Settings page: author new category rules and manage saved ones
use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

use crate::commands::Command;
use crate::rules::{GroupColor, RuleRecord};
use crate::settings::{
    CUSTOM_NAME, DraftEdit, DraftField, FieldError, PRESET_NAMES, RuleDraft, merge_records, validate_drafts,
};
use crate::ui::components::RuleCard;
use crate::ui::messaging::send_command;

#[derive(Clone, PartialEq)]
enum PageState {
    Loading,
    Idle,
    Saving,
    Saved(String),
    Error(String),
}

#[function_component(SettingsPage)]
pub fn settings_page() -> Html {
    let state = use_state(|| PageState::Loading);
    let saved = use_state(Vec::<RuleRecord>::new);
    let drafts = use_state(|| vec![RuleDraft::new()]);
    let errors = use_state(Vec::<FieldError>::new);

    // Load saved rules on mount
    {
        let state = state.clone();
        let saved = saved.clone();

        use_effect_with((), move |_| {
            spawn_local(async move {
                match send_command(&Command::GetGroupConfigs).await {
                    Ok(response) => {
                        saved.set(response.group_configs.unwrap_or_default());
                        state.set(PageState::Idle);
                    }
                    Err(e) => state.set(PageState::Error(format!("Failed to load: {}", e))),
                }
            });
            || ()
        });
    }

    let on_edit = {
        let drafts = drafts.clone();
        Callback::from(move |(form, edit): (usize, DraftEdit)| {
            let mut next = (*drafts).clone();
            if let Some(draft) = next.get_mut(form) {
                draft.apply(edit);
            }
            drafts.set(next);
        })
    };

    let on_add_form = {
        let drafts = drafts.clone();
        Callback::from(move |_: MouseEvent| {
            let mut next = (*drafts).clone();
            next.push(RuleDraft::new());
            drafts.set(next);
        })
    };

    let on_remove_form = {
        let drafts = drafts.clone();
        let errors = errors.clone();
        Callback::from(move |form: usize| {
            let mut next = (*drafts).clone();
            if next.len() > 1 && form < next.len() {
                next.remove(form);
                errors.set(Vec::new());
            }
            drafts.set(next);
        })
    };

    let on_save = {
        let state = state.clone();
        let saved = saved.clone();
        let drafts = drafts.clone();
        let errors = errors.clone();

        Callback::from(move |_: MouseEvent| {
            let added = match validate_drafts(&drafts) {
                Ok(added) => added,
                Err(found) => {
                    errors.set(found);
                    return;
                }
            };
            errors.set(Vec::new());

            let merged = merge_records(&saved, added);
            let state = state.clone();
            let saved = saved.clone();
            let drafts = drafts.clone();
            state.set(PageState::Saving);

            spawn_local(async move {
                let command = Command::SaveGroupConfigs {
                    group_configs: merged.clone(),
                };
                match send_command(&command).await {
                    Ok(response) if !response.is_error() => {
                        saved.set(merged);
                        drafts.set(vec![RuleDraft::new()]);
                        state.set(PageState::Saved("Settings saved".to_string()));
                    }
                    Ok(response) => state.set(PageState::Error(response.error.unwrap_or(response.status))),
                    Err(e) => state.set(PageState::Error(e)),
                }
            });
        })
    };

    let on_delete = {
        let state = state.clone();
        let saved = saved.clone();

        Callback::from(move |name: String| {
            let state = state.clone();
            let saved = saved.clone();
            state.set(PageState::Saving);

            spawn_local(async move {
                match send_command(&Command::DeleteGroup { name: name.clone() }).await {
                    Ok(response) if !response.is_error() => {
                        let remaining: Vec<RuleRecord> = saved.iter().filter(|r| r.name != name).cloned().collect();
                        saved.set(remaining);
                        state.set(PageState::Saved(format!("Deleted {}", name)));
                    }
                    Ok(response) => state.set(PageState::Error(response.error.unwrap_or(response.status))),
                    Err(e) => state.set(PageState::Error(e)),
                }
            });
        })
    };

    let is_busy = matches!(*state, PageState::Loading | PageState::Saving);

    html! {
        <div class="padding-20">
            <h1 class="page-title">{"Tab Grouper Settings"}</h1>

            {match &*state {
                PageState::Loading | PageState::Saving => html! {
                    <div class="loading-text-center">
                        <Spinner />
                    </div>
                },
                PageState::Saved(msg) => html! {
                    <Alert r#type={AlertType::Success} title={msg.clone()} inline={true}>
                    </Alert>
                },
                PageState::Error(err) => html! {
                    <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                        {err.clone()}
                    </Alert>
                },
                PageState::Idle => html! {}
            }}

            <h2 class="section-title">{"New groups"}</h2>
            <div class="draft-list">
                {for drafts.iter().enumerate().map(|(form, draft)| {
                    let form_errors: Vec<FieldError> = errors.iter().filter(|e| e.form == form).cloned().collect();
                    html! {
                        <DraftForm
                            form={form}
                            draft={draft.clone()}
                            errors={form_errors}
                            removable={drafts.len() > 1}
                            on_edit={on_edit.clone()}
                            on_remove={on_remove_form.clone()}
                        />
                    }
                })}
            </div>

            <div class="flex-row-gap">
                <Button onclick={on_add_form} disabled={is_busy} variant={ButtonVariant::Secondary}>
                    {"Add another group"}
                </Button>
                <Button onclick={on_save} disabled={is_busy} variant={ButtonVariant::Primary}>
                    {"Save"}
                </Button>
            </div>

            <h2 class="section-title">{"Saved groups"}</h2>
            if saved.is_empty() {
                <div class="empty-state">
                    <p>{"No groups saved yet."}</p>
                </div>
            } else {
                <div class="rules-list">
                    {for saved.iter().map(|record| html! {
                        <RuleCard record={record.clone()} on_delete={on_delete.clone()} disabled={is_busy} />
                    })}
                </div>
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct DraftFormProps {
    form: usize,
    draft: RuleDraft,
    errors: Vec<FieldError>,
    removable: bool,
    on_edit: Callback<(usize, DraftEdit)>,
    on_remove: Callback<usize>,
}

#[function_component(DraftForm)]
fn draft_form(props: &DraftFormProps) -> Html {
    let form = props.form;
    let draft = &props.draft;

    let error_for = |field: DraftField| -> Html {
        match props.errors.iter().find(|e| e.field == field) {
            Some(error) => html! { <p class="field-error">{&error.message}</p> },
            None => html! {},
        }
    };

    let on_preset = props.on_edit.reform(move |e: Event| {
        let value = e
            .target_dyn_into::<HtmlSelectElement>()
            .map(|select| select.value())
            .unwrap_or_default();
        (form, DraftEdit::Preset(value))
    });

    let on_custom = props.on_edit.reform(move |e: InputEvent| {
        let value = e
            .target_dyn_into::<HtmlInputElement>()
            .map(|input| input.value())
            .unwrap_or_default();
        (form, DraftEdit::Custom(value))
    });

    let on_color = props.on_edit.reform(move |e: Event| {
        let value = e
            .target_dyn_into::<HtmlSelectElement>()
            .map(|select| select.value())
            .unwrap_or_default();
        (form, DraftEdit::Color(value))
    });

    let on_add_url = props.on_edit.reform(move |_: MouseEvent| (form, DraftEdit::AddUrl));
    let on_remove = props.on_remove.reform(move |_: MouseEvent| form);

    html! {
        <div class="draft-card">
            <label class="field-label">{"Group name"}</label>
            <select class="field-select" onchange={on_preset}>
                <option value="" selected={draft.preset_name.is_empty()}>{"Select a group"}</option>
                {for PRESET_NAMES.iter().map(|name| html! {
                    <option value={*name} selected={draft.preset_name == *name}>{*name}</option>
                })}
            </select>
            if draft.preset_name == CUSTOM_NAME {
                <input
                    type="text"
                    class="field-input"
                    placeholder="Custom group name"
                    value={draft.custom_name.clone()}
                    oninput={on_custom}
                />
            }
            {error_for(DraftField::Name)}

            <label class="field-label">{"Color"}</label>
            <select class="field-select" onchange={on_color}>
                <option value="" selected={draft.color.is_empty()}>{"Select a color"}</option>
                {for GroupColor::ALL.iter().map(|color| html! {
                    <option value={color.as_str()} selected={draft.color == color.as_str()}>{color.as_str()}</option>
                })}
            </select>
            {error_for(DraftField::Color)}

            <label class="field-label">{"Sites"}</label>
            {for draft.urls.iter().enumerate().map(|(index, url)| {
                let on_url = props.on_edit.reform(move |e: InputEvent| {
                    let value = e
                        .target_dyn_into::<HtmlInputElement>()
                        .map(|input| input.value())
                        .unwrap_or_default();
                    (form, DraftEdit::Url(index, value))
                });
                let on_remove_url = props.on_edit.reform(move |_: MouseEvent| (form, DraftEdit::RemoveUrl(index)));

                html! {
                    <div class="url-row">
                        <input
                            type="text"
                            class="field-input"
                            placeholder="https://example.com"
                            value={url.clone()}
                            oninput={on_url}
                        />
                        if draft.urls.len() > 1 {
                            <Button onclick={on_remove_url} variant={ButtonVariant::Plain}>{"✗"}</Button>
                        }
                        {error_for(DraftField::Url(index))}
                    </div>
                }
            })}

            <div class="flex-row-gap">
                <Button onclick={on_add_url} variant={ButtonVariant::Link}>{"Add site"}</Button>
                if props.removable {
                    <Button onclick={on_remove} variant={ButtonVariant::Link}>{"Remove group"}</Button>
                }
            </div>
        </div>
    }
}
