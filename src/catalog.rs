//! Static content catalogs and the search/filter views over them

use crate::error::CatalogError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
	Pending,
	Approved,
	Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
	Published,
	Draft,
	Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
	Easy,
	Medium,
	Hard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoContent {
	pub id: String,
	pub title: String,
	pub description: String,
	#[serde(default)]
	pub tags: Vec<String>,
	pub file_url: String,
	#[serde(default)]
	pub thumbnail_url: String,
	pub creator: String,
	pub creator_id: String,
	/// Seconds.
	pub duration: u32,
	/// Bytes.
	#[serde(default)]
	pub file_size: u64,
	pub upload_time: DateTime<Utc>,
	pub audit_status: AuditStatus,
	#[serde(default)]
	pub view_count: u64,
	pub category: String,
	pub grade: String,
	pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
	pub id: String,
	pub title: String,
	pub description: String,
	pub grade: String,
	pub subject: String,
	#[serde(default)]
	pub theme: String,
	pub teacher_id: String,
	pub teacher_name: String,
	#[serde(default)]
	pub video_ids: Vec<String>,
	#[serde(default)]
	pub tags: Vec<String>,
	pub difficulty: Difficulty,
	pub status: CourseStatus,
	#[serde(default)]
	pub enrolled_students: u32,
	#[serde(default)]
	pub estimated_hours: f64,
	#[serde(default)]
	pub rating: Option<f64>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// Lower-cases `needle` once and matches it against any of `haystacks`.
///
/// An empty search matches everything. Whitespace is significant.
pub(crate) fn matches_search<'a>(
	needle: &str,
	mut haystacks: impl Iterator<Item = &'a str>,
) -> bool {
	let needle = needle.to_lowercase();
	needle.is_empty() || haystacks.any(|h| h.to_lowercase().contains(&needle))
}

/// Library search: `None` facets mean "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoQuery {
	/// Matched case-insensitively against title, description and tags.
	pub search: String,
	pub status: Option<AuditStatus>,
	pub category: Option<String>,
}

impl VideoQuery {
	pub fn matches(&self, video: &VideoContent) -> bool {
		let text = [video.title.as_str(), video.description.as_str()]
			.into_iter()
			.chain(video.tags.iter().map(String::as_str));

		matches_search(&self.search, text)
			&& self.status.map_or(true, |s| video.audit_status == s)
			&& self
				.category
				.as_ref()
				.map_or(true, |c| &video.category == c)
	}
}

/// Course search: `None` facets mean "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseQuery {
	/// Matched case-insensitively against title and description.
	pub search: String,
	pub grade: Option<String>,
	pub subject: Option<String>,
	pub status: Option<CourseStatus>,
}

impl CourseQuery {
	pub fn matches(&self, course: &Course) -> bool {
		let text = [course.title.as_str(), course.description.as_str()].into_iter();

		matches_search(&self.search, text)
			&& self.grade.as_ref().map_or(true, |g| &course.grade == g)
			&& self.subject.as_ref().map_or(true, |s| &course.subject == s)
			&& self.status.map_or(true, |s| course.status == s)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoSort {
	/// Most viewed first.
	ViewCount,
	/// Newest first.
	UploadTime,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditSummary {
	pub pending: usize,
	pub approved: usize,
	pub rejected: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CatalogDocument {
	videos: Vec<VideoContent>,
	courses: Vec<Course>,
}

/// The read-only video and course datasets pages render from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
	videos: Vec<VideoContent>,
	courses: Vec<Course>,
}

impl Catalog {
	pub fn new(videos: Vec<VideoContent>, courses: Vec<Course>) -> Self {
		Self { videos, courses }
	}

	/// Loads a `{"videos": [...], "courses": [...]}` document. Either list
	/// may be omitted.
	pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
		let doc: CatalogDocument = serde_json::from_str(json)?;
		Ok(Self::new(doc.videos, doc.courses))
	}

	pub fn videos(&self) -> &[VideoContent] {
		&self.videos
	}

	pub fn courses(&self) -> &[Course] {
		&self.courses
	}

	pub fn find_video(&self, id: &str) -> Result<&VideoContent, CatalogError> {
		self.videos
			.iter()
			.find(|v| v.id == id)
			.ok_or_else(|| CatalogError::NotFound {
				kind: "video",
				id: id.to_string(),
			})
	}

	pub fn find_course(&self, id: &str) -> Result<&Course, CatalogError> {
		self.courses
			.iter()
			.find(|c| c.id == id)
			.ok_or_else(|| CatalogError::NotFound {
				kind: "course",
				id: id.to_string(),
			})
	}

	/// Matching videos in catalog order.
	pub fn search_videos(&self, query: &VideoQuery) -> Vec<&VideoContent> {
		self.videos.iter().filter(|v| query.matches(v)).collect()
	}

	/// Matching courses in catalog order.
	pub fn search_courses(&self, query: &CourseQuery) -> Vec<&Course> {
		self.courses.iter().filter(|c| query.matches(c)).collect()
	}

	/// Distinct video categories in first-seen order.
	pub fn categories(&self) -> Vec<&str> {
		let mut categories: Vec<&str> = Vec::new();
		for video in &self.videos {
			if !categories.contains(&video.category.as_str()) {
				categories.push(&video.category);
			}
		}
		categories
	}

	pub fn audit_summary(&self) -> AuditSummary {
		self.videos
			.iter()
			.fold(AuditSummary::default(), |mut summary, video| {
				match video.audit_status {
					AuditStatus::Pending => summary.pending += 1,
					AuditStatus::Approved => summary.approved += 1,
					AuditStatus::Rejected => summary.rejected += 1,
				}
				summary
			})
	}

	/// Number of courses with `status`.
	pub fn course_count(&self, status: CourseStatus) -> usize {
		self.courses.iter().filter(|c| c.status == status).count()
	}

	/// Up to `limit` other videos in the same category as `id`, in catalog
	/// order.
	pub fn related_videos(
		&self,
		id: &str,
		limit: usize,
	) -> Result<Vec<&VideoContent>, CatalogError> {
		let video = self.find_video(id)?;
		Ok(self
			.videos
			.iter()
			.filter(|v| v.id != video.id && v.category == video.category)
			.take(limit)
			.collect())
	}

	/// Stable sort; ties keep catalog order.
	pub fn sort_videos(videos: &mut [&VideoContent], by: VideoSort) {
		match by {
			VideoSort::ViewCount => videos.sort_by(|a, b| b.view_count.cmp(&a.view_count)),
			VideoSort::UploadTime => videos.sort_by(|a, b| b.upload_time.cmp(&a.upload_time)),
		}
	}
}
