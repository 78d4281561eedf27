//! View commands: render once, or keep polling with `--watch`.

use chrono::{Local, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::Value;
use tokio::runtime::Runtime;
use tracing::warn;

use super::Context;
use crate::accent::{self, Accent};
use crate::api::{DashboardApi, TimeRange};
use crate::cli::render;
use crate::error::Error;
use crate::poll::{PollConfig, PollingController, Resource, ViewState};
use crate::projection::{self, RecordKind, SortCriterion, format};
use crate::session::SessionStatus;
use crate::views::{self, AlbumQuery, Route};

fn ensure_signed_in(ctx: &Context) -> anyhow::Result<()> {
    if ctx.session.is_authenticated() {
        Ok(())
    } else {
        Err(Error::not_signed_in("run `feedback-fm login` first").into())
    }
}

fn expired() -> anyhow::Error {
    Error::not_signed_in("session expired, run `feedback-fm login` again").into()
}

/// Fail if a 401 dropped the session while fetching.
fn check_session(ctx: &Context) -> anyhow::Result<()> {
    match ctx.session.status() {
        SessionStatus::Expired => Err(expired()),
        _ => Ok(()),
    }
}

fn controller<R: Resource>(ctx: &Context, resource: R) -> PollingController<R> {
    PollingController::new(
        resource,
        ctx.api(),
        ctx.session.clone(),
        ctx.config.views.stale_data,
    )
}

fn print_frame(text: &str) {
    println!("\n--- {} ---\n{}", Local::now().format("%H:%M:%S"), text);
}

/// Fetch one resource and print it, once or on every change.
async fn show<R: Resource>(
    ctx: &Context,
    resource: R,
    key: R::Key,
    route: Route,
    watch: bool,
    render: impl Fn(&ViewState<R::Output>) -> String,
) -> anyhow::Result<()> {
    let mut view = controller(ctx, resource);
    view.start(key, route.poll_config(&ctx.config.polling)?);

    if !watch {
        let state = view.settled().await;
        println!("{}", render(&state));
        return check_session(ctx);
    }

    let mut updates = view.subscribe();
    let mut session = ctx.session.subscribe();
    print_frame(&render(&updates.borrow_and_update()));

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let text = render(&updates.borrow_and_update());
                print_frame(&text);
            }
            changed = session.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = *session.borrow_and_update();
                if Route::for_status(status) == Some(Route::Login) {
                    return Err(expired());
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    view.stop();
    Ok(())
}

/// Display name of a detail resource, for list headers.
async fn title_of<R>(
    ctx: &Context,
    resource: R,
    key: R::Key,
    route: Route,
    kind: RecordKind,
) -> String
where
    R: Resource<Output = Value>,
{
    let mut detail = controller(ctx, resource);
    match route.poll_config(&ctx.config.polling) {
        Ok(config) => detail.start(key, config),
        Err(_) => return projection::project_name(&Value::Null, kind),
    }
    let state = detail.settled().await;
    projection::project_name(state.data().unwrap_or(&Value::Null), kind)
}

pub fn cmd_profile(rt: &Runtime, ctx: &Context, watch: bool) -> anyhow::Result<()> {
    ensure_signed_in(ctx)?;
    rt.block_on(show(ctx, views::profile(), (), Route::Dashboard, watch, |state| {
        render::state(state, |profile| render::fields("Profile", profile))
    }))
}

pub fn cmd_stats(rt: &Runtime, ctx: &Context, watch: bool) -> anyhow::Result<()> {
    ensure_signed_in(ctx)?;
    rt.block_on(show(ctx, views::stats(), (), Route::Dashboard, watch, |state| {
        render::state(state, |stats| render::fields("Listening Stats", stats))
    }))
}

pub fn cmd_artists(
    rt: &Runtime,
    ctx: &Context,
    range: TimeRange,
    sort: SortCriterion,
    filter: Option<&str>,
    watch: bool,
) -> anyhow::Result<()> {
    ensure_signed_in(ctx)?;
    let query = filter.unwrap_or_default().to_string();
    rt.block_on(show(ctx, views::top_artists(), range, Route::TopArtists, watch, move |state| {
        render::state(state, |records| {
            let matching = projection::filter_by_text(records, &query, &[&projection::ARTIST_NAME]);
            render::artists(&projection::sort_by(&matching, sort), range)
        })
    }))
}

pub fn cmd_songs(
    rt: &Runtime,
    ctx: &Context,
    range: TimeRange,
    sort: SortCriterion,
    filter: Option<&str>,
    watch: bool,
) -> anyhow::Result<()> {
    ensure_signed_in(ctx)?;
    let query = filter.unwrap_or_default().to_string();
    rt.block_on(show(ctx, views::top_songs(), range, Route::TopSongs, watch, move |state| {
        render::state(state, |records| {
            let matching = projection::filter_by_text(
                records,
                &query,
                &[&projection::SONG_NAME, &projection::SONG_ARTIST],
            );
            render::songs(&projection::sort_by(&matching, sort), range)
        })
    }))
}

pub fn cmd_now_playing(rt: &Runtime, ctx: &Context, watch: bool) -> anyhow::Result<()> {
    ensure_signed_in(ctx)?;
    rt.block_on(show(
        ctx,
        views::currently_playing(),
        (),
        Route::CurrentlyPlaying,
        watch,
        |state| render::state(state, render::now_playing),
    ))
}

pub fn cmd_history(rt: &Runtime, ctx: &Context, limit: u32, watch: bool) -> anyhow::Result<()> {
    ensure_signed_in(ctx)?;
    let clamped = views::clamp_history_limit(limit);
    if clamped != limit {
        warn!("History limit {} out of range, using {}", limit, clamped);
    }
    rt.block_on(show(ctx, views::history(), clamped, Route::History, watch, |state| {
        render::state(state, |records| render::history(records))
    }))
}

pub fn cmd_playlists(
    rt: &Runtime,
    ctx: &Context,
    id: Option<&str>,
    watch: bool,
) -> anyhow::Result<()> {
    ensure_signed_in(ctx)?;
    rt.block_on(async {
        let Some(id) = id else {
            return show(ctx, views::playlists(), (), Route::Playlists, watch, |state| {
                render::state(state, |records| render::playlists(records))
            })
            .await;
        };

        let title = title_of(
            ctx,
            views::playlist(),
            id.to_string(),
            Route::Playlists,
            RecordKind::Playlist,
        )
        .await;
        show(
            ctx,
            views::playlist_songs(),
            id.to_string(),
            Route::Playlists,
            watch,
            move |state| render::state(state, |records| render::tracks(&title, records)),
        )
        .await
    })
}

pub fn cmd_albums(
    rt: &Runtime,
    ctx: &Context,
    id: Option<&str>,
    search: Option<&str>,
    watch: bool,
) -> anyhow::Result<()> {
    ensure_signed_in(ctx)?;
    rt.block_on(async {
        let Some(id) = id else {
            let query = match search {
                Some(text) => AlbumQuery::Search(text.to_string()),
                None => AlbumQuery::All,
            };
            return show(ctx, views::albums(), query, Route::Albums, watch, |state| {
                render::state(state, |records| render::albums(records))
            })
            .await;
        };

        let title = title_of(
            ctx,
            views::album(),
            id.to_string(),
            Route::Albums,
            RecordKind::Album,
        )
        .await;
        show(
            ctx,
            views::album_songs(),
            id.to_string(),
            Route::Albums,
            watch,
            move |state| render::state(state, |records| render::tracks(&title, records)),
        )
        .await
    })
}

/// Accent of the track last seen playing.
#[derive(Default)]
struct AccentCache {
    track: Option<String>,
    accent: Option<Accent>,
}

impl AccentCache {
    /// Pick a new accent when a different track starts playing.
    ///
    /// Keeps the previous accent while nothing is playing.
    async fn update(
        &mut self,
        state: &ViewState<Option<Value>>,
        quips: &str,
        api: &dyn DashboardApi,
        rng: &mut StdRng,
    ) {
        let Some(track) = state
            .data()
            .and_then(Option::as_ref)
            .filter(|track| format::is_actively_playing(track))
        else {
            return;
        };

        let identity = format!(
            "{}|{}",
            projection::project_key(track, 0),
            projection::project_name(track, RecordKind::Track)
        );
        if self.track.as_deref() == Some(identity.as_str()) {
            return;
        }

        self.accent = Some(accent::accent_for_track(track, quips, api, rng).await);
        self.track = Some(identity);
    }
}

fn load_quips(ctx: &Context) -> String {
    match accent::load_quips(ctx.config.views.quips_path.as_deref()) {
        Ok(quips) => quips,
        Err(e) => {
            warn!("{}, using built-in quips", e);
            accent::load_quips(None).unwrap_or_default()
        }
    }
}

/// Profile, now playing and recently played, each on its own schedule.
pub fn cmd_dashboard(rt: &Runtime, ctx: &Context, watch: bool) -> anyhow::Result<()> {
    ensure_signed_in(ctx)?;
    let polling = &ctx.config.polling;
    let quips = load_quips(ctx);
    let mut rng = StdRng::from_os_rng();
    let api = ctx.client.as_ref();

    rt.block_on(async {
        let mut dashboard = controller(ctx, views::dashboard());
        let mut playing = controller(ctx, views::currently_playing());
        let mut recent = controller(ctx, views::history());

        dashboard.start((), Route::Dashboard.poll_config(polling)?);
        playing.start((), PollConfig::every_secs(polling.now_playing_widget_secs)?);
        recent.start(
            views::RECENTLY_PLAYED_LIMIT,
            PollConfig::every_secs(polling.history_secs)?,
        );

        let mut accent = AccentCache::default();

        if !watch {
            let (data, track, history) =
                futures::join!(dashboard.settled(), playing.settled(), recent.settled());
            accent.update(&track, &quips, api, &mut rng).await;
            println!(
                "{}",
                render::dashboard(&data, &track, &history, accent.accent.as_ref(), Utc::now())
            );
            return check_session(ctx);
        }

        let mut data_rx = dashboard.subscribe();
        let mut track_rx = playing.subscribe();
        let mut history_rx = recent.subscribe();
        let mut session = ctx.session.subscribe();

        let draw = |accent: Option<&Accent>| {
            render::dashboard(
                &dashboard.state(),
                &playing.state(),
                &recent.state(),
                accent,
                Utc::now(),
            )
        };
        print_frame(&draw(accent.accent.as_ref()));

        loop {
            tokio::select! {
                changed = data_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = track_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    accent.update(&playing.state(), &quips, api, &mut rng).await;
                }
                changed = history_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = session.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if Route::for_status(*session.borrow_and_update()) == Some(Route::Login) {
                        return Err(expired());
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
            print_frame(&draw(accent.accent.as_ref()));
        }

        Ok::<_, anyhow::Error>(())
    })
}
