/// Popup UI: group, save and restore tabs
use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::commands::Command;
use crate::ui::messaging::{open_settings, send_command};

#[derive(Clone, PartialEq)]
enum AppState {
    Idle,
    Loading(String),
    Done(String),
    Error(String),
}

#[function_component(App)]
pub fn app() -> Html {
    let state = use_state(|| AppState::Idle);

    let run = {
        let state = state.clone();
        move |command: Command, busy: &'static str| {
            let state = state.clone();
            Callback::from(move |_: MouseEvent| {
                let state = state.clone();
                let command = command.clone();
                state.set(AppState::Loading(busy.to_string()));

                spawn_local(async move {
                    match send_command(&command).await {
                        Ok(response) => match response.error {
                            Some(error) => state.set(AppState::Error(format!("{}: {}", response.status, error))),
                            None => state.set(AppState::Done(response.status)),
                        },
                        Err(e) => state.set(AppState::Error(e)),
                    }
                });
            })
        }
    };

    let on_group = run(Command::GroupTabs, "Grouping tabs...");
    let on_save = run(Command::SaveTabs, "Saving tabs...");
    let on_restore = run(Command::RestoreTabs, "Restoring tabs...");

    let on_settings = Callback::from(|_: MouseEvent| {
        spawn_local(open_settings());
    });

    let is_busy = matches!(*state, AppState::Loading(_));

    html! {
        <div class="padding-20">
            <h1 class="popup-title">{"Tab Grouper"}</h1>

            {match &*state {
                AppState::Loading(msg) => html! {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{msg}</p>
                    </div>
                },
                AppState::Done(msg) => html! {
                    <div class="message-top-margin">
                        <Alert r#type={AlertType::Success} title={msg.clone()} inline={true}>
                        </Alert>
                    </div>
                },
                AppState::Error(err) => html! {
                    <div class="message-top-margin">
                        <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                            {err.clone()}
                        </Alert>
                    </div>
                },
                AppState::Idle => html! {}
            }}

            <div class="flex-column-gap">
                <Button onclick={on_group} disabled={is_busy} variant={ButtonVariant::Primary} block={true}>
                    {"Group Tabs"}
                </Button>
                <Button onclick={on_save} disabled={is_busy} variant={ButtonVariant::Secondary} block={true}>
                    {"Save Tabs"}
                </Button>
                <Button onclick={on_restore} disabled={is_busy} variant={ButtonVariant::Secondary} block={true}>
                    {"Restore Tabs"}
                </Button>
                <Button onclick={on_settings} variant={ButtonVariant::Link} block={true}>
                    {"Settings"}
                </Button>
            </div>

            <p class="footer-popup">
                {"Tab Grouper v0.1.0"}
            </p>
        </div>
    }
}
