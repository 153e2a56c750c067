//! Optimistic projections
//!
//! Predicts how a care action changes each cached read model:
//! - Calendar tasks: the task's `completed` flag
//! - Home snapshot: eco score, and progress for plant-level actions
//! - Plant detail: growth, care timestamps, next actions, water history
//!
//! Projections mutate in place and never fail; a view that does not
//! contain the task or plant is left untouched.

use chrono::{DateTime, Utc};
use garden_assistant_shared::care::{
    care_interval, eco_points_delta, next_growth_percent, next_progress_pct, WELL_CARED_COLOR,
    WELL_CARED_LABEL,
};
use garden_assistant_shared::{
    ActionType, CalendarTasksView, CareAction, HomeSnapshotView, NextActionStatus,
    PlantDetailView, WaterHistoryPoint,
};

/// Optimistic projection of care actions onto cached views
pub struct OptimisticProjector;

impl OptimisticProjector {
    /// Set a task's completion flag; returns whether the task was found
    pub fn mark_task(view: &mut CalendarTasksView, task_id: &str, completed: bool) -> bool {
        match view.find_mut(task_id) {
            Some(task) => {
                task.completed = completed;
                true
            }
            None => false,
        }
    }

    /// Apply a care action to the calendar
    pub fn apply_to_calendar(view: &mut CalendarTasksView, action: &CareAction) -> bool {
        match &action.task_id {
            Some(task_id) => Self::mark_task(view, task_id, !action.uncomplete),
            None => false,
        }
    }

    /// Apply a care action to the home snapshot
    ///
    /// The eco score always moves by the action's delta. Plant-level
    /// actions also bump the plant's progress and mark it as cared for.
    pub fn apply_to_home(view: &mut HomeSnapshotView, action: &CareAction) {
        view.eco_score += eco_points_delta(action.action_type, action.uncomplete);

        if !action.is_plant_level() {
            return;
        }
        if let Some(plant) = view.plant_mut(&action.user_plant_id) {
            plant.progress_pct = next_progress_pct(plant.progress_pct, action.action_type);
            plant.next_action_label = WELL_CARED_LABEL.to_string();
            plant.next_action_color = WELL_CARED_COLOR.to_string();
        }
    }

    /// Apply a completing care action to the plant detail
    ///
    /// Reversals are not projected here; the next refetch settles them.
    pub fn apply_to_plant_detail(
        view: &mut PlantDetailView,
        action: &CareAction,
        now: DateTime<Utc>,
    ) {
        if !action.is_completing() {
            return;
        }

        let action_type = action.action_type;
        view.growth_percent = next_growth_percent(view.growth_percent, action_type);
        let next_due = care_interval(action_type).map(|interval| now + interval);

        match action_type {
            ActionType::Water => {
                view.last_watered_at = Some(now);
                view.next_water_due = next_due;
                view.analytics.water_history.insert(
                    0,
                    WaterHistoryPoint {
                        date: now.date_naive(),
                        amount_ml: action.effective_amount(),
                    },
                );
            }
            ActionType::Fertilize => {
                view.last_fertilized_at = Some(now);
                view.next_fertilize_due = next_due;
            }
            ActionType::Harvest => {
                view.last_harvested_at = Some(now);
                view.next_actions
                    .retain(|next| next.action_type != ActionType::Harvest);
                return;
            }
        }

        for next in view
            .next_actions
            .iter_mut()
            .filter(|next| next.action_type == action_type)
        {
            next.due_date = next_due;
            next.status = NextActionStatus::Scheduled;
        }
    }

    /// Undo a care action on a calendar
    ///
    /// The task's flag goes back to its value in `before`; other tasks keep
    /// whatever they hold now. Returns whether the task was reset.
    pub fn revert_calendar(
        view: &mut CalendarTasksView,
        before: &CalendarTasksView,
        action: &CareAction,
    ) -> bool {
        let Some(task_id) = &action.task_id else {
            return false;
        };
        match before.find(task_id) {
            Some(task) => Self::mark_task(view, task_id, task.completed),
            None => false,
        }
    }

    /// Undo a care action on the home snapshot
    ///
    /// Only this action's delta leaves the eco score, and only its own
    /// plant summary goes back to `before`.
    pub fn revert_home(view: &mut HomeSnapshotView, before: &HomeSnapshotView, action: &CareAction) {
        view.eco_score -= eco_points_delta(action.action_type, action.uncomplete);

        if !action.is_plant_level() {
            return;
        }
        let previous = before.plants.iter().find(|p| p.id == action.user_plant_id);
        if let (Some(plant), Some(previous)) = (view.plant_mut(&action.user_plant_id), previous) {
            *plant = previous.clone();
        }
    }

    /// Drop a plant from the home snapshot; returns whether it was listed
    pub fn remove_plant_from_home(view: &mut HomeSnapshotView, user_plant_id: &str) -> bool {
        let before = view.plants.len();
        view.plants.retain(|plant| plant.id != user_plant_id);
        view.plants.len() != before
    }

    /// Put a plant back into the home snapshot at its position in `before`
    pub fn restore_plant_to_home(
        view: &mut HomeSnapshotView,
        before: &HomeSnapshotView,
        user_plant_id: &str,
    ) -> bool {
        if view.plants.iter().any(|p| p.id == user_plant_id) {
            return false;
        }
        match before.plants.iter().position(|p| p.id == user_plant_id) {
            Some(index) => {
                let at = index.min(view.plants.len());
                view.plants.insert(at, before.plants[index].clone());
                true
            }
            None => false,
        }
    }

    /// Put back a plant's tasks as they were in `before`; returns how many
    pub fn restore_plant_tasks(
        view: &mut CalendarTasksView,
        before: &CalendarTasksView,
        user_plant_id: &str,
    ) -> usize {
        let mut restored = 0;
        for (date, tasks) in &before.days {
            for (index, task) in tasks.iter().enumerate() {
                if task.user_plant_id != user_plant_id || view.find(&task.id).is_some() {
                    continue;
                }
                let day = view.days.entry(*date).or_default();
                day.insert(index.min(day.len()), task.clone());
                restored += 1;
            }
        }
        restored
    }

    /// Drop every task of a plant from a calendar; returns how many were removed
    pub fn remove_plant_tasks(view: &mut CalendarTasksView, user_plant_id: &str) -> usize {
        let before = view.task_count();
        for tasks in view.days.values_mut() {
            tasks.retain(|task| task.user_plant_id != user_plant_id);
        }
        view.days.retain(|_, tasks| !tasks.is_empty());
        before - view.task_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};
    use garden_assistant_shared::{NextAction, PlantAnalytics, PlantSummary, Task};
    use proptest::prelude::*;
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 9, 30, 0).unwrap()
    }

    fn task(id: &str, plant: &str, day: u32) -> Task {
        Task {
            id: id.to_string(),
            user_plant_id: plant.to_string(),
            task_type: ActionType::Water,
            due_date: NaiveDate::from_ymd_opt(2026, 10, day).unwrap(),
            completed: false,
            notes: None,
        }
    }

    fn home() -> HomeSnapshotView {
        HomeSnapshotView {
            eco_score: 100,
            delta_week: 4,
            streak_days: 3,
            liters_saved: 1.5,
            plants: vec![PlantSummary {
                id: "p1".to_string(),
                name: "Basil".to_string(),
                photo_url: None,
                progress_pct: 40.0,
                next_action_label: "Water today".to_string(),
                next_action_color: "#F44336".to_string(),
            }],
        }
    }

    fn detail(growth: f64) -> PlantDetailView {
        PlantDetailView {
            id: "p1".to_string(),
            name: "Basil".to_string(),
            growth_percent: growth,
            last_watered_at: None,
            last_fertilized_at: None,
            last_harvested_at: None,
            next_water_due: None,
            next_fertilize_due: None,
            next_actions: vec![
                NextAction {
                    action_type: ActionType::Water,
                    due_date: None,
                    status: NextActionStatus::Overdue,
                },
                NextAction {
                    action_type: ActionType::Fertilize,
                    due_date: None,
                    status: NextActionStatus::Upcoming,
                },
                NextAction {
                    action_type: ActionType::Harvest,
                    due_date: None,
                    status: NextActionStatus::Upcoming,
                },
            ],
            analytics: PlantAnalytics::default(),
        }
    }

    #[test]
    fn test_calendar_flip_and_revert() {
        let mut view = CalendarTasksView::from_tasks(vec![task("t1", "p1", 17), task("t2", "p1", 18)]);
        let action = CareAction::for_task("t1", "p1", ActionType::Water);

        assert!(OptimisticProjector::apply_to_calendar(&mut view, &action));
        assert!(view.find("t1").unwrap().completed);
        assert!(!view.find("t2").unwrap().completed);

        assert!(OptimisticProjector::apply_to_calendar(&mut view, &action.uncompleted()));
        assert!(!view.find("t1").unwrap().completed);
    }

    #[test]
    fn test_calendar_ignores_unknown_task() {
        let mut view = CalendarTasksView::from_tasks(vec![task("t1", "p1", 17)]);
        let before = view.clone();
        let action = CareAction::for_task("t9", "p1", ActionType::Water);
        assert!(!OptimisticProjector::apply_to_calendar(&mut view, &action));
        assert_eq!(view, before);
    }

    #[rstest]
    #[case(ActionType::Water, 101)]
    #[case(ActionType::Fertilize, 102)]
    #[case(ActionType::Harvest, 103)]
    fn test_home_score_for_task_action(#[case] action_type: ActionType, #[case] expected: i64) {
        let mut view = home();
        OptimisticProjector::apply_to_home(&mut view, &CareAction::for_task("t1", "p1", action_type));
        assert_eq!(view.eco_score, expected);
        // task actions leave plant progress alone
        assert_eq!(view.plants[0].progress_pct, 40.0);
        assert_eq!(view.plants[0].next_action_label, "Water today");
    }

    #[rstest]
    #[case(ActionType::Water, 41.0)]
    #[case(ActionType::Fertilize, 41.0)]
    #[case(ActionType::Harvest, 100.0)]
    fn test_home_plant_level_progress(#[case] action_type: ActionType, #[case] expected: f64) {
        let mut view = home();
        OptimisticProjector::apply_to_home(&mut view, &CareAction::for_plant("p1", action_type));
        assert_eq!(view.plants[0].progress_pct, expected);
        assert_eq!(view.plants[0].next_action_label, WELL_CARED_LABEL);
        assert_eq!(view.plants[0].next_action_color, WELL_CARED_COLOR);
    }

    #[test]
    fn test_home_uncomplete_negates() {
        let mut view = home();
        let action = CareAction::for_task("t1", "p1", ActionType::Fertilize);
        OptimisticProjector::apply_to_home(&mut view, &action);
        OptimisticProjector::apply_to_home(&mut view, &action.clone().uncompleted());
        assert_eq!(view, home());
    }

    #[test]
    fn test_plant_detail_water() {
        let mut view = detail(50.0);
        let action = CareAction::for_task("t1", "p1", ActionType::Water);
        OptimisticProjector::apply_to_plant_detail(&mut view, &action, now());

        assert_eq!(view.growth_percent, 52.0);
        assert_eq!(view.last_watered_at, Some(now()));
        assert_eq!(view.next_water_due, Some(now() + Duration::days(2)));
        assert_eq!(view.next_actions[0].due_date, Some(now() + Duration::days(2)));
        assert_eq!(view.next_actions[0].status, NextActionStatus::Scheduled);
        assert_eq!(view.next_actions[1].status, NextActionStatus::Upcoming);
        assert_eq!(
            view.analytics.water_history,
            vec![WaterHistoryPoint {
                date: now().date_naive(),
                amount_ml: 250.0,
            }]
        );
    }

    #[test]
    fn test_plant_detail_water_history_is_prepended() {
        let mut view = detail(10.0);
        view.analytics.water_history.push(WaterHistoryPoint {
            date: NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(),
            amount_ml: 300.0,
        });
        let action = CareAction::for_plant("p1", ActionType::Water).with_amount(400.0);
        OptimisticProjector::apply_to_plant_detail(&mut view, &action, now());
        assert_eq!(view.analytics.water_history.len(), 2);
        assert_eq!(view.analytics.water_history[0].amount_ml, 400.0);
    }

    #[test]
    fn test_plant_detail_fertilize() {
        let mut view = detail(98.0);
        let action = CareAction::for_task("t2", "p1", ActionType::Fertilize);
        OptimisticProjector::apply_to_plant_detail(&mut view, &action, now());

        assert_eq!(view.growth_percent, 100.0);
        assert_eq!(view.last_fertilized_at, Some(now()));
        assert_eq!(view.next_fertilize_due, Some(now() + Duration::days(14)));
        assert_eq!(view.next_actions[1].status, NextActionStatus::Scheduled);
        assert!(view.analytics.water_history.is_empty());
    }

    #[test]
    fn test_plant_detail_harvest() {
        let mut view = detail(30.0);
        let action = CareAction::for_plant("p1", ActionType::Harvest);
        OptimisticProjector::apply_to_plant_detail(&mut view, &action, now());

        assert_eq!(view.growth_percent, 100.0);
        assert_eq!(view.last_harvested_at, Some(now()));
        assert!(view
            .next_actions
            .iter()
            .all(|next| next.action_type != ActionType::Harvest));
        assert_eq!(view.next_actions.len(), 2);
    }

    #[test]
    fn test_plant_detail_untouched_by_uncomplete() {
        let mut view = detail(30.0);
        let action = CareAction::for_task("t1", "p1", ActionType::Water).uncompleted();
        OptimisticProjector::apply_to_plant_detail(&mut view, &action, now());
        assert_eq!(view, detail(30.0));
    }

    #[test]
    fn test_remove_plant() {
        let mut view = home();
        assert!(OptimisticProjector::remove_plant_from_home(&mut view, "p1"));
        assert!(!OptimisticProjector::remove_plant_from_home(&mut view, "p1"));
        assert!(view.plants.is_empty());

        let mut calendar = CalendarTasksView::from_tasks(vec![
            task("t1", "p1", 17),
            task("t2", "p2", 17),
            task("t3", "p1", 18),
        ]);
        assert_eq!(OptimisticProjector::remove_plant_tasks(&mut calendar, "p1"), 2);
        assert_eq!(calendar.task_count(), 1);
        assert_eq!(calendar.days.len(), 1);
    }

    #[test]
    fn test_revert_calendar_only_resets_own_task() {
        let before = CalendarTasksView::from_tasks(vec![task("t1", "p1", 17), task("t2", "p2", 17)]);
        let mut view = before.clone();
        let own = CareAction::for_task("t1", "p1", ActionType::Water);
        let other = CareAction::for_task("t2", "p2", ActionType::Fertilize);
        OptimisticProjector::apply_to_calendar(&mut view, &own);
        OptimisticProjector::apply_to_calendar(&mut view, &other);

        assert!(OptimisticProjector::revert_calendar(&mut view, &before, &own));
        assert!(!view.find("t1").unwrap().completed);
        assert!(view.find("t2").unwrap().completed);

        let plant_level = CareAction::for_plant("p1", ActionType::Water);
        assert!(!OptimisticProjector::revert_calendar(&mut view, &before, &plant_level));
    }

    #[test]
    fn test_revert_home_keeps_other_actions() {
        let mut before = home();
        before.plants.push(PlantSummary {
            id: "p2".to_string(),
            name: "Mint".to_string(),
            photo_url: None,
            progress_pct: 10.0,
            next_action_label: "Water today".to_string(),
            next_action_color: "#F44336".to_string(),
        });
        let mut view = before.clone();
        let own = CareAction::for_plant("p1", ActionType::Harvest);
        let other = CareAction::for_plant("p2", ActionType::Fertilize);
        OptimisticProjector::apply_to_home(&mut view, &own);
        OptimisticProjector::apply_to_home(&mut view, &other);

        OptimisticProjector::revert_home(&mut view, &before, &own);
        assert_eq!(view.eco_score, 102);
        assert_eq!(view.plants[0], before.plants[0]);
        assert_eq!(view.plants[1].progress_pct, 11.0);
        assert_eq!(view.plants[1].next_action_label, WELL_CARED_LABEL);
    }

    #[test]
    fn test_restore_removed_plant() {
        let before_home = home();
        let mut view = before_home.clone();
        OptimisticProjector::remove_plant_from_home(&mut view, "p1");
        assert!(OptimisticProjector::restore_plant_to_home(&mut view, &before_home, "p1"));
        assert!(!OptimisticProjector::restore_plant_to_home(&mut view, &before_home, "p1"));
        assert_eq!(view, before_home);

        let before = CalendarTasksView::from_tasks(vec![
            task("t1", "p1", 17),
            task("t2", "p2", 17),
            task("t3", "p1", 18),
        ]);
        let mut calendar = before.clone();
        OptimisticProjector::remove_plant_tasks(&mut calendar, "p1");
        // a concurrent action on p2 stays
        OptimisticProjector::mark_task(&mut calendar, "t2", true);

        assert_eq!(OptimisticProjector::restore_plant_tasks(&mut calendar, &before, "p1"), 2);
        let ids: Vec<_> = calendar.days.values().flatten().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2", "t3"]);
        assert!(calendar.find("t2").unwrap().completed);
        assert!(!calendar.find("t1").unwrap().completed);
    }

    fn growth_action() -> impl Strategy<Value = ActionType> {
        prop_oneof![Just(ActionType::Water), Just(ActionType::Fertilize)]
    }

    // Property: growth stays in [0, 100] across any water/fertilize sequence
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_growth_clamped(
            start in 0.0f64..=100.0,
            actions in prop::collection::vec(growth_action(), 0..80)
        ) {
            let mut view = detail(start);
            for action_type in actions {
                let action = CareAction::for_plant("p1", action_type);
                OptimisticProjector::apply_to_plant_detail(&mut view, &action, now());
                prop_assert!((0.0..=100.0).contains(&view.growth_percent));
            }
        }

        #[test]
        fn test_apply_then_revert_is_exact(
            score in -10_000i64..10_000,
            uncomplete in any::<bool>(),
            action_type in prop_oneof![
                Just(ActionType::Water),
                Just(ActionType::Fertilize),
                Just(ActionType::Harvest)
            ]
        ) {
            let mut before = home();
            before.eco_score = score;
            let mut view = before.clone();
            let mut action = CareAction::for_plant("p1", action_type);
            action.uncomplete = uncomplete;
            OptimisticProjector::apply_to_home(&mut view, &action);
            OptimisticProjector::revert_home(&mut view, &before, &action);
            prop_assert_eq!(view, before);
        }

        #[test]
        fn test_complete_then_uncomplete_restores_score(
            score in -10_000i64..10_000,
            action_type in prop_oneof![
                Just(ActionType::Water),
                Just(ActionType::Fertilize),
                Just(ActionType::Harvest)
            ]
        ) {
            let mut view = home();
            view.eco_score = score;
            let action = CareAction::for_task("t1", "p1", action_type);
            OptimisticProjector::apply_to_home(&mut view, &action);
            OptimisticProjector::apply_to_home(&mut view, &action.uncompleted());
            prop_assert_eq!(view.eco_score, score);
        }
    }
}
