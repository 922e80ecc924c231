//! Coursework datasets and their list views
//!
//! Assignments, discussion threads, lesson plans, creative works and
//! competitions are read-only lists like the [`Catalog`](crate::Catalog).
//! Each has a query type whose `None` facets mean "all" and whose search text
//! is matched case-insensitively, plus the counters its page header shows.

use crate::catalog::matches_search;
use crate::error::CatalogError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Assignments
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
	NotStarted,
	InProgress,
	Submitted,
	Graded,
	Overdue,
}

impl AssignmentStatus {
	/// Still waiting on the student.
	pub fn is_pending(self) -> bool {
		matches!(self, AssignmentStatus::NotStarted | AssignmentStatus::InProgress)
	}

	/// Handed in, graded or not.
	pub fn is_handed_in(self) -> bool {
		matches!(self, AssignmentStatus::Submitted | AssignmentStatus::Graded)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentKind {
	Essay,
	Video,
	Quiz,
	Project,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
	pub id: String,
	pub title: String,
	pub description: String,
	#[serde(rename = "type")]
	pub kind: AssignmentKind,
	pub course_title: String,
	pub teacher_name: String,
	pub due: DateTime<Utc>,
	pub total_points: u32,
	pub status: AssignmentStatus,
	#[serde(default)]
	pub submitted_at: Option<DateTime<Utc>>,
	#[serde(default)]
	pub score: Option<u32>,
	#[serde(default)]
	pub feedback: Option<String>,
}

impl Assignment {
	/// Past its due time and not handed in. Independent of a stored
	/// [`AssignmentStatus::Overdue`].
	pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
		self.due < now && !self.status.is_handed_in()
	}
}

/// The tabs of the assignment list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AssignmentTab {
	#[default]
	All,
	Pending,
	Submitted,
	Overdue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentQuery {
	/// Matched against title and description.
	pub search: String,
	pub status: Option<AssignmentStatus>,
	pub kind: Option<AssignmentKind>,
}

impl AssignmentQuery {
	pub fn matches(&self, assignment: &Assignment) -> bool {
		let text = [assignment.title.as_str(), assignment.description.as_str()].into_iter();

		matches_search(&self.search, text)
			&& self.status.map_or(true, |s| assignment.status == s)
			&& self.kind.map_or(true, |k| assignment.kind == k)
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AssignmentStats {
	pub total: usize,
	pub pending: usize,
	pub submitted: usize,
	pub overdue: usize,
	/// Mean over scored assignments; `0.0` when none are scored.
	pub average_score: f64,
}

/// Matching assignments on `tab`, in list order.
///
/// # Arguments
/// * `now` - The instant the overdue tab compares due times against
pub fn assignment_view<'a>(
	assignments: &'a [Assignment],
	query: &AssignmentQuery,
	tab: AssignmentTab,
	now: DateTime<Utc>,
) -> Vec<&'a Assignment> {
	assignments
		.iter()
		.filter(|a| query.matches(a))
		.filter(|a| match tab {
			AssignmentTab::All => true,
			AssignmentTab::Pending => a.status.is_pending(),
			AssignmentTab::Submitted => a.status.is_handed_in(),
			AssignmentTab::Overdue => a.is_overdue(now),
		})
		.collect()
}

/// Header counters over the whole list, ignoring any query.
pub fn assignment_stats(assignments: &[Assignment], now: DateTime<Utc>) -> AssignmentStats {
	let scores: Vec<u32> = assignments.iter().filter_map(|a| a.score).collect();
	let average_score = if scores.is_empty() {
		0.0
	} else {
		scores.iter().map(|&s| f64::from(s)).sum::<f64>() / scores.len() as f64
	};

	AssignmentStats {
		total: assignments.len(),
		pending: assignments.iter().filter(|a| a.status.is_pending()).count(),
		submitted: assignments.iter().filter(|a| a.status.is_handed_in()).count(),
		overdue: assignments.iter().filter(|a| a.is_overdue(now)).count(),
		average_score,
	}
}

// =============================================================================
// Discussions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discussion {
	pub id: String,
	pub title: String,
	pub content: String,
	pub author_id: String,
	pub author_name: String,
	pub category: String,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default)]
	pub views: u32,
	#[serde(default)]
	pub likes: u32,
	#[serde(default)]
	pub replies: u32,
	#[serde(default)]
	pub is_pinned: bool,
	#[serde(default)]
	pub is_locked: bool,
	pub created_at: DateTime<Utc>,
	pub last_reply_at: DateTime<Utc>,
}

/// Orderings of the discussion board. `Pinned` keeps list order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiscussionView {
	/// Most recent reply first.
	#[default]
	Latest,
	/// Most liked first.
	Popular,
	/// Most replied first.
	Hot,
	Pinned,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscussionQuery {
	/// Matched against title, content and tags.
	pub search: String,
	pub category: Option<String>,
}

impl DiscussionQuery {
	pub fn matches(&self, discussion: &Discussion) -> bool {
		let text = [discussion.title.as_str(), discussion.content.as_str()]
			.into_iter()
			.chain(discussion.tags.iter().map(String::as_str));

		matches_search(&self.search, text)
			&& self
				.category
				.as_ref()
				.map_or(true, |c| &discussion.category == c)
	}
}

/// Matching discussions arranged for `view`. Sorts are stable.
pub fn discussion_view<'a>(
	discussions: &'a [Discussion],
	query: &DiscussionQuery,
	view: DiscussionView,
) -> Vec<&'a Discussion> {
	let mut found: Vec<&Discussion> = discussions.iter().filter(|d| query.matches(d)).collect();
	match view {
		DiscussionView::Latest => found.sort_by(|a, b| b.last_reply_at.cmp(&a.last_reply_at)),
		DiscussionView::Popular => found.sort_by(|a, b| b.likes.cmp(&a.likes)),
		DiscussionView::Hot => found.sort_by(|a, b| b.replies.cmp(&a.replies)),
		DiscussionView::Pinned => found.retain(|d| d.is_pinned),
	}
	found
}

/// Distinct discussion categories in first-seen order.
pub fn discussion_categories(discussions: &[Discussion]) -> Vec<&str> {
	let mut categories: Vec<&str> = Vec::new();
	for discussion in discussions {
		if !categories.contains(&discussion.category.as_str()) {
			categories.push(&discussion.category);
		}
	}
	categories
}

// =============================================================================
// Lesson plans
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LessonPlanStatus {
	Published,
	Draft,
	InProgress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPlan {
	pub id: String,
	pub teacher_id: String,
	pub title: String,
	pub topic: String,
	pub course_id: String,
	pub grade: String,
	pub subject: String,
	pub status: LessonPlanStatus,
	/// Minutes.
	pub duration: u32,
	#[serde(default)]
	pub objectives: Vec<String>,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default)]
	pub is_shared: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonPlanQuery {
	/// Matched against title and topic.
	pub search: String,
	pub grade: Option<String>,
	pub subject: Option<String>,
	pub status: Option<LessonPlanStatus>,
}

impl LessonPlanQuery {
	pub fn matches(&self, plan: &LessonPlan) -> bool {
		let text = [plan.title.as_str(), plan.topic.as_str()].into_iter();

		matches_search(&self.search, text)
			&& self.grade.as_ref().map_or(true, |g| &plan.grade == g)
			&& self.subject.as_ref().map_or(true, |s| &plan.subject == s)
			&& self.status.map_or(true, |s| plan.status == s)
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LessonPlanSummary {
	pub total: usize,
	pub published: usize,
	pub draft: usize,
	pub in_progress: usize,
}

impl LessonPlanSummary {
	pub fn of(plans: &[LessonPlan]) -> Self {
		plans.iter().fold(
			Self {
				total: plans.len(),
				..Default::default()
			},
			|mut summary, plan| {
				match plan.status {
					LessonPlanStatus::Published => summary.published += 1,
					LessonPlanStatus::Draft => summary.draft += 1,
					LessonPlanStatus::InProgress => summary.in_progress += 1,
				}
				summary
			},
		)
	}
}

// =============================================================================
// Creative works and competitions
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkKind {
	Video,
	Script,
	Poster,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreativeWork {
	pub id: String,
	pub title: String,
	pub description: String,
	#[serde(rename = "type")]
	pub kind: WorkKind,
	pub author_id: String,
	pub author_name: String,
	pub category: String,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default)]
	pub views: u32,
	#[serde(default)]
	pub likes: u32,
	pub submitted_at: DateTime<Utc>,
	#[serde(default)]
	pub competition_id: Option<String>,
	#[serde(default)]
	pub score: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionStatus {
	Upcoming,
	Ongoing,
	Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competition {
	pub id: String,
	pub title: String,
	pub description: String,
	pub category: String,
	pub status: CompetitionStatus,
	pub start_date: DateTime<Utc>,
	pub end_date: DateTime<Utc>,
	#[serde(default)]
	pub max_participants: u32,
	#[serde(default)]
	pub current_participants: u32,
}

/// Search shared by the works and competitions tabs. `kind` only applies
/// to works.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PracticeQuery {
	/// Matched against title and description.
	pub search: String,
	pub kind: Option<WorkKind>,
	pub category: Option<String>,
}

impl PracticeQuery {
	pub fn matches_work(&self, work: &CreativeWork) -> bool {
		let text = [work.title.as_str(), work.description.as_str()].into_iter();

		matches_search(&self.search, text)
			&& self.kind.map_or(true, |k| work.kind == k)
			&& self.category.as_ref().map_or(true, |c| &work.category == c)
	}

	pub fn matches_competition(&self, competition: &Competition) -> bool {
		let text = [competition.title.as_str(), competition.description.as_str()].into_iter();

		matches_search(&self.search, text)
			&& self
				.category
				.as_ref()
				.map_or(true, |c| &competition.category == c)
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PracticeStats {
	pub total_works: usize,
	/// Works by the signed-in user.
	pub my_works: usize,
	pub total_competitions: usize,
	pub ongoing_competitions: usize,
}

// =============================================================================
// Dataset
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CourseworkDocument {
	assignments: Vec<Assignment>,
	discussions: Vec<Discussion>,
	lesson_plans: Vec<LessonPlan>,
	creative_works: Vec<CreativeWork>,
	competitions: Vec<Competition>,
}

/// The read-only coursework lists pages render from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coursework {
	pub assignments: Vec<Assignment>,
	pub discussions: Vec<Discussion>,
	pub lesson_plans: Vec<LessonPlan>,
	pub creative_works: Vec<CreativeWork>,
	pub competitions: Vec<Competition>,
}

impl Coursework {
	/// Loads a document with any of the `assignments`, `discussions`,
	/// `lessonPlans`, `creativeWorks` and `competitions` lists.
	pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
		let doc: CourseworkDocument = serde_json::from_str(json)?;
		Ok(Self {
			assignments: doc.assignments,
			discussions: doc.discussions,
			lesson_plans: doc.lesson_plans,
			creative_works: doc.creative_works,
			competitions: doc.competitions,
		})
	}

	pub fn find_assignment(&self, id: &str) -> Result<&Assignment, CatalogError> {
		self.assignments
			.iter()
			.find(|a| a.id == id)
			.ok_or_else(|| CatalogError::NotFound {
				kind: "assignment",
				id: id.to_string(),
			})
	}

	pub fn find_lesson_plan(&self, id: &str) -> Result<&LessonPlan, CatalogError> {
		self.lesson_plans
			.iter()
			.find(|p| p.id == id)
			.ok_or_else(|| CatalogError::NotFound {
				kind: "lesson plan",
				id: id.to_string(),
			})
	}

	pub fn search_lesson_plans(&self, query: &LessonPlanQuery) -> Vec<&LessonPlan> {
		self.lesson_plans.iter().filter(|p| query.matches(p)).collect()
	}

	pub fn search_works(&self, query: &PracticeQuery) -> Vec<&CreativeWork> {
		self.creative_works
			.iter()
			.filter(|w| query.matches_work(w))
			.collect()
	}

	pub fn search_competitions(&self, query: &PracticeQuery) -> Vec<&Competition> {
		self.competitions
			.iter()
			.filter(|c| query.matches_competition(c))
			.collect()
	}

	/// Header counters of the practice page. `user_id` is `None` when signed
	/// out, which counts no works as the user's own.
	pub fn practice_stats(&self, user_id: Option<&str>) -> PracticeStats {
		PracticeStats {
			total_works: self.creative_works.len(),
			my_works: self
				.creative_works
				.iter()
				.filter(|w| Some(w.author_id.as_str()) == user_id)
				.count(),
			total_competitions: self.competitions.len(),
			ongoing_competitions: self
				.competitions
				.iter()
				.filter(|c| c.status == CompetitionStatus::Ongoing)
				.count(),
		}
	}
}
